use anyhow::anyhow;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flagdesk::app::flags::PgFlagStore;
use flagdesk::config::AppConfig;
use flagdesk::console::{self, ConsoleNotifier};
use flagdesk::infra::{cache::RedisCache, db::Db};
use flagdesk::review::{FlagReviewController, StaticAdmin};
use flagdesk::{http, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::from_env()?;
    let db = Db::connect(&config).await?;

    match config.app_mode.as_str() {
        "api" => {
            let cache = RedisCache::connect(&config.redis_url).await?;
            let state = AppState {
                db,
                cache,
                paseto_access_key: config.paseto_access_key,
                access_ttl_minutes: config.access_ttl_minutes,
                flag_reports_per_hour: config.flag_reports_per_hour,
            };

            let app: Router =
                http::router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));
            let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
            tracing::info!("listening on {}", config.http_addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        "review" => {
            if config.review_admin_id.is_none() {
                tracing::warn!("REVIEW_ADMIN_ID not set; moderation actions will be refused");
            }
            let controller = FlagReviewController::new(
                Arc::new(PgFlagStore::new(db)),
                Arc::new(StaticAdmin(config.review_admin_id)),
                Arc::new(ConsoleNotifier),
                Duration::from_millis(config.refresh_delay_ms),
            );

            tokio::select! {
                result = console::run(controller) => {
                    result?;
                }
                _ = shutdown_signal() => {}
            }
        }
        other => return Err(anyhow!("unknown APP_MODE: {}", other)),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

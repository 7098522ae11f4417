use axum::{routing::delete, routing::get, routing::patch, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn admin_flags() -> Router<AppState> {
    Router::new()
        .route("/admin/flags", get(handlers::list_flags))
        .route("/admin/flags/:id/history", get(handlers::flag_history))
        .route("/admin/flags/:id/status", patch(handlers::update_flag_status))
        .route("/admin/questions/:id", delete(handlers::delete_question))
}

pub fn questions() -> Router<AppState> {
    Router::new().route("/questions/:id/flag", post(handlers::flag_question))
}

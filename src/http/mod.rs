use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod routes;

pub use auth::{AdminUser, AuthUser};
pub use error::AppError;

const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health())
        .merge(routes::admin_flags())
        .merge(routes::questions())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

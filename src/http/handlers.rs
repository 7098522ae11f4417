use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::app::flags::{FlagError, FlagService, PgFlagStore};
use crate::app::rate_limiter::{RateLimiter, RateWindow};
use crate::domain::moderation::{FlagHistoryEntry, FlagStatus};
use crate::domain::question::FlaggedQuestion;
use crate::http::{AdminUser, AppError, AuthUser};
use crate::review::filter::{filter_questions, FlagStats, StatusCounts, StatusFilter};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = state.db.ping().await.is_ok();
    let redis = state.cache.ping().await.is_ok();
    let status = if db && redis { "ok" } else { "degraded" };

    Json(HealthResponse { status })
}

fn service_error(err: FlagError, context: &'static str) -> AppError {
    if let FlagError::Service(_) = err {
        tracing::error!(error = ?err, "{}", context);
    }
    err.into()
}

#[derive(Deserialize)]
pub struct FlagListQuery {
    pub status: Option<String>,
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct FlagListResponse {
    pub items: Vec<FlaggedQuestion>,
    pub counts: StatusCounts,
    pub stats: FlagStats,
}

pub async fn list_flags(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<FlagListQuery>,
) -> Result<Json<FlagListResponse>, AppError> {
    let filter = match query.status.as_deref() {
        Some(status) => status
            .parse::<StatusFilter>()
            .map_err(|err| AppError::bad_request(err.to_string()))?,
        None => StatusFilter::All,
    };
    let search = query.q.unwrap_or_default();

    let service = PgFlagStore::new(state.db.clone());
    let questions = service
        .list_flagged()
        .await
        .map_err(|err| service_error(err, "failed to list flagged questions"))?;

    Ok(Json(FlagListResponse {
        items: filter_questions(&questions, filter, &search),
        counts: StatusCounts::from_questions(&questions),
        stats: FlagStats::from_questions(&questions),
    }))
}

pub async fn flag_history(
    _admin: AdminUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<FlagHistoryEntry>>, AppError> {
    let service = PgFlagStore::new(state.db.clone());
    let history = service
        .get_history(&id)
        .await
        .map_err(|err| service_error(err, "failed to load flag history"))?;

    Ok(Json(history))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn update_flag_status(
    admin: AdminUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<StatusCode, AppError> {
    let status = payload
        .status
        .parse::<FlagStatus>()
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    let service = PgFlagStore::new(state.db.clone());
    service
        .update_status(&id, status, admin.admin_id)
        .await
        .map_err(|err| service_error(err, "failed to update flag status"))?;

    tracing::info!(question_id = %id, status = %status, admin_id = %admin.admin_id, "flag status updated");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_question(
    admin: AdminUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = PgFlagStore::new(state.db.clone());
    service
        .delete_question(&id, admin.admin_id)
        .await
        .map_err(|err| service_error(err, "failed to delete question"))?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct FlagQuestionRequest {
    pub reason: Option<String>,
}

pub async fn flag_question(
    auth: AuthUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<FlagQuestionRequest>,
) -> Result<StatusCode, AppError> {
    const MAX_REASON_LEN: usize = 500;

    if payload
        .reason
        .as_ref()
        .is_some_and(|reason| reason.chars().count() > MAX_REASON_LEN)
    {
        return Err(AppError::bad_request("reason must be at most 500 characters"));
    }

    let limiter = RateLimiter::new(state.cache.clone());
    let limit = limiter
        .hit(
            auth.user_id,
            "flag",
            state.flag_reports_per_hour,
            RateWindow::Hour,
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id, "failed to check rate limit");
            AppError::internal("failed to check rate limit")
        })?;
    if limit.limited {
        return Err(AppError::rate_limited(
            "Too many flag reports. Please try again later.",
        ));
    }

    let service = PgFlagStore::new(state.db.clone());
    service
        .flag_question(&id, auth.user_id, payload.reason)
        .await
        .map_err(|err| service_error(err, "failed to flag question"))?;

    tracing::info!(question_id = %id, reporter_id = %auth.user_id, remaining = limit.remaining, "question flagged");
    Ok(StatusCode::NO_CONTENT)
}

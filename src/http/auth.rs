use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::app::auth::AuthService;
use crate::http::AppError;
use crate::AppState;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: uuid::Uuid,
}

/// An authenticated user whose profile carries the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub admin_id: uuid::Uuid,
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        state.db.clone(),
        state.paseto_access_key,
        state.access_ttl_minutes,
    )
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("invalid Authorization header"))?;

        let session = auth_service(state)
            .authenticate_access_token(token)
            .map_err(|err| {
                tracing::error!(error = ?err, "failed to authenticate");
                AppError::internal("failed to authenticate")
            })?;

        let session = session.ok_or_else(|| AppError::unauthorized("invalid token"))?;
        Ok(AuthUser {
            user_id: session.user_id,
        })
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        let is_admin = auth_service(state)
            .is_admin(user.user_id)
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, user_id = %user.user_id, "failed to check admin role");
                AppError::internal("failed to check admin role")
            })?;

        if !is_admin {
            return Err(AppError::forbidden("admin role required"));
        }

        Ok(AdminUser {
            admin_id: user.user_id,
        })
    }
}

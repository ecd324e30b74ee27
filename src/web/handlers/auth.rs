//! Authentication handlers.

use axum::{extract::State, Json};
use std::sync::Arc;
use utoipa;

use crate::db::UserRepository;
use crate::web::dto::{ApiResponse, LoginRequest, LoginResponse, UserInfo, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// POST /api/auth/login - Exchange an identity provider token for a session.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    responses(
        (status = 200, description = "Login successful"),
        (status = 401, description = "Invalid identity token")
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    // Verify the provider token and sync the user record
    let claims = state
        .identity_verifier
        .verify(&req.id_token)
        .map_err(|e| {
            tracing::debug!("Identity token rejected: {}", e);
            ApiError::unauthorized("Invalid identity token")
        })?;

    let user = UserRepository::new(state.db.pool())
        .upsert_identity(&claims)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert user: {}", e);
            ApiError::internal("Failed to log in")
        })?;

    let access_token = state
        .jwt
        .issue_access_token(user.id, &user.email, &user.name, state.access_token_expiry)
        .map_err(|e| {
            tracing::error!("Failed to issue token: {}", e);
            ApiError::internal("Failed to generate token")
        })?;

    Ok(Json(ApiResponse::new(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.access_token_expiry,
        user: user.into(),
    })))
}

/// GET /api/auth/me - Current user information.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = UserRepository::new(state.db.pool())
        .get_by_id(claims.sub)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load user: {}", e);
            ApiError::internal("Failed to load user")
        })?
        .ok_or_else(|| ApiError::unauthorized("Unknown user"))?;

    Ok(Json(ApiResponse::new(user.into())))
}

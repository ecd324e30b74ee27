//! Share handlers for Web API.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use utoipa;

use crate::db::UserRepository;
use crate::file::FileRepository;
use crate::notify::Event;
use crate::share::{access, NewShare, ShareRepository};
use crate::web::dto::{
    ApiResponse, FileResponse, ShareRequest, ShareResponse, SharedByMeResponse,
    UpdatePermissionRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// Check ownership, then fetch the file.
///
/// The ownership check runs first so a missing file and someone else's
/// file produce the same 403.
async fn owned_file(
    state: &AppState,
    file_id: i64,
    user_id: i64,
) -> Result<crate::file::FileRecord, ApiError> {
    if !access::is_owner(state.db.pool(), user_id, file_id).await? {
        return Err(ApiError::forbidden("Only the owner can manage shares"));
    }

    FileRepository::new(state.db.pool())
        .get_by_id(file_id)
        .await?
        .ok_or_else(|| ApiError::not_found("File not found"))
}

/// POST /api/files/:id/shares - Share a file with another user.
///
/// Sharing again with the same recipient updates the permission in place.
#[utoipa::path(
    post,
    path = "/files/{id}/shares",
    tag = "shares",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "Share created or updated"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Recipient not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_share(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<ShareRequest>,
) -> Result<Json<ApiResponse<ShareResponse>>, ApiError> {
    let file = owned_file(&state, file_id, claims.sub).await?;

    if file.deleted {
        return Err(ApiError::unprocessable("Cannot share a file in trash"));
    }

    let grantee = UserRepository::new(state.db.pool())
        .get_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::not_found("No user with that email address"))?;

    if grantee.id == claims.sub {
        return Err(ApiError::unprocessable("Cannot share a file with yourself"));
    }

    let shares = ShareRepository::new(state.db.pool());
    shares
        .upsert(&NewShare {
            file_id,
            grantee_id: grantee.id,
            granter_id: claims.sub,
            permission: req.permission,
        })
        .await?;

    // Re-read with grantee info for the response
    let share = shares
        .list_for_file(file_id)
        .await?
        .into_iter()
        .find(|s| s.grantee_id == grantee.id)
        .ok_or_else(|| ApiError::internal("Share vanished after creation"))?;

    state
        .sessions
        .send(
            grantee.id,
            Event::FileShared {
                file_id,
                file_name: file.name.clone(),
                shared_by: claims.name.clone(),
                permission: req.permission,
            },
        )
        .await;

    tracing::info!(
        user_id = claims.sub,
        file_id,
        grantee_id = grantee.id,
        permission = %req.permission,
        "file shared"
    );

    Ok(Json(ApiResponse::new(share.into())))
}

/// GET /api/files/:id/shares - List a file's shares. Owner only.
#[utoipa::path(
    get,
    path = "/files/{id}/shares",
    tag = "shares",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "List of shares"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_shares(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<ShareResponse>>>, ApiError> {
    owned_file(&state, file_id, claims.sub).await?;

    let shares = ShareRepository::new(state.db.pool())
        .list_for_file(file_id)
        .await?;

    let responses: Vec<ShareResponse> = shares.into_iter().map(Into::into).collect();

    Ok(Json(ApiResponse::new(responses)))
}

/// PATCH /api/files/:id/shares/:share_id - Change a share's permission.
#[utoipa::path(
    patch,
    path = "/files/{id}/shares/{share_id}",
    tag = "shares",
    params(
        ("id" = i64, Path, description = "File ID"),
        ("share_id" = i64, Path, description = "Share ID")
    ),
    responses(
        (status = 200, description = "Permission updated"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Share not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_share(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path((file_id, share_id)): Path<(i64, i64)>,
    ValidatedJson(req): ValidatedJson<UpdatePermissionRequest>,
) -> Result<Json<ApiResponse<ShareResponse>>, ApiError> {
    let file = owned_file(&state, file_id, claims.sub).await?;

    let shares = ShareRepository::new(state.db.pool());
    let share = shares
        .get_by_id(share_id)
        .await?
        .filter(|s| s.file_id == file_id)
        .ok_or_else(|| ApiError::not_found("Share not found"))?;

    shares.update_permission(share_id, req.permission).await?;

    let updated = shares
        .list_for_file(file_id)
        .await?
        .into_iter()
        .find(|s| s.id == share_id)
        .ok_or_else(|| ApiError::not_found("Share not found"))?;

    state
        .sessions
        .send(
            share.grantee_id,
            Event::FileShared {
                file_id,
                file_name: file.name.clone(),
                shared_by: claims.name.clone(),
                permission: req.permission,
            },
        )
        .await;

    Ok(Json(ApiResponse::new(updated.into())))
}

/// DELETE /api/files/:id/shares/:share_id - Revoke a share.
#[utoipa::path(
    delete,
    path = "/files/{id}/shares/{share_id}",
    tag = "shares",
    params(
        ("id" = i64, Path, description = "File ID"),
        ("share_id" = i64, Path, description = "Share ID")
    ),
    responses(
        (status = 200, description = "Share revoked"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Share not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn revoke_share(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path((file_id, share_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let file = owned_file(&state, file_id, claims.sub).await?;

    let shares = ShareRepository::new(state.db.pool());
    let share = shares
        .get_by_id(share_id)
        .await?
        .filter(|s| s.file_id == file_id)
        .ok_or_else(|| ApiError::not_found("Share not found"))?;

    shares.delete(share_id).await?;

    state
        .sessions
        .send(
            share.grantee_id,
            Event::ShareRevoked {
                file_id,
                file_name: file.name.clone(),
            },
        )
        .await;

    tracing::info!(
        user_id = claims.sub,
        file_id,
        grantee_id = share.grantee_id,
        "share revoked"
    );

    Ok(Json(ApiResponse::new(())))
}

/// GET /api/shared-by-me - List the caller's files that carry grants.
#[utoipa::path(
    get,
    path = "/shared-by-me",
    tag = "shares",
    responses(
        (status = 200, description = "Files shared out by the caller"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn shared_by_me(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Vec<SharedByMeResponse>>>, ApiError> {
    let files = FileRepository::new(state.db.pool())
        .list_owned_with_shares(claims.sub)
        .await?;

    let shares = ShareRepository::new(state.db.pool());
    let mut responses = Vec::with_capacity(files.len());
    for file in files {
        let file_shares = shares.list_for_file(file.id).await?;
        responses.push(SharedByMeResponse {
            file: FileResponse::owned(&file),
            shares: file_shares.into_iter().map(Into::into).collect(),
        });
    }

    Ok(Json(ApiResponse::new(responses)))
}

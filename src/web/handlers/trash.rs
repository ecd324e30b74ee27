//! Trash handlers for Web API.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;
use utoipa;

use crate::web::dto::{ApiResponse, FileResponse, PurgeQuery, RestoreRequest, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// GET /api/trash - List the caller's trashed files.
#[utoipa::path(
    get,
    path = "/trash",
    tag = "trash",
    responses(
        (status = 200, description = "List of trashed files"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_trash(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let files = state.file_service().list_trash(claims.sub).await?;

    let responses: Vec<FileResponse> = files.iter().map(FileResponse::owned).collect();

    Ok(Json(ApiResponse::new(responses)))
}

/// POST /api/trash/restore - Restore a trashed file.
#[utoipa::path(
    post,
    path = "/trash/restore",
    tag = "trash",
    responses(
        (status = 200, description = "File restored"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 422, description = "File is not in trash")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn restore_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<RestoreRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = state
        .file_service()
        .restore(req.file_id, claims.sub)
        .await?;

    tracing::info!(user_id = claims.sub, file_id = file.id, "file restored");

    Ok(Json(ApiResponse::new(FileResponse::owned(&file))))
}

/// DELETE /api/trash?file_id= - Permanently remove a trashed file.
///
/// The metadata row and all grants go away atomically; the blob is
/// removed afterwards.
#[utoipa::path(
    delete,
    path = "/trash",
    tag = "trash",
    params(
        ("file_id" = i64, Query, description = "File ID")
    ),
    responses(
        (status = 200, description = "File purged"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 422, description = "File is not in trash")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn purge_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Query(query): Query<PurgeQuery>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.file_service().purge(query.file_id, claims.sub).await?;

    tracing::info!(user_id = claims.sub, file_id = query.file_id, "file purged");

    Ok(Json(ApiResponse::new(())))
}

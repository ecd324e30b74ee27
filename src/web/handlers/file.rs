//! File handlers for Web API.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::header,
    response::Response,
    Json,
};
use std::sync::Arc;
use utoipa;

use crate::file::UploadRequest;
use crate::share::ShareRepository;
use crate::web::dto::{
    ApiResponse, DeleteResponse, DownloadTokenQuery, DownloadUrlResponse, FileResponse, ListQuery,
    RenameRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Sanitizes the filename to prevent header injection and uses RFC 5987
/// encoding for non-ASCII filenames.
fn content_disposition_header(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' => '_',
            '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

/// POST /api/files - Upload a file.
#[utoipa::path(
    post,
    path = "/files",
    tag = "files",
    responses(
        (status = 200, description = "File uploaded"),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation failed")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let mut upload: Option<UploadRequest> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::bad_request("Missing filename"))?;

        // Fall back to extension-based detection when the client sends no type
        let mime_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| {
                mime_guess::from_path(&filename)
                    .first_or_octet_stream()
                    .to_string()
            });

        let content = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?
            .to_vec();

        upload = Some(UploadRequest::new(filename, mime_type, content));
    }

    let upload = upload.ok_or_else(|| ApiError::bad_request("Missing file field"))?;

    let file = state.file_service().upload(&upload, claims.sub).await?;

    tracing::info!(user_id = claims.sub, file_id = file.id, "file uploaded");

    Ok(Json(ApiResponse::new(FileResponse::owned(&file))))
}

/// GET /api/files - List files visible to the caller.
///
/// Returns the caller's active files plus files shared with them,
/// optionally filtered by a case-insensitive name substring.
#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    params(
        ("q" = Option<String>, Query, description = "Name filter")
    ),
    responses(
        (status = 200, description = "List of visible files"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let q = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let (owned, shared) = state.file_service().list_visible(claims.sub, q).await?;

    let mut responses: Vec<FileResponse> = owned.iter().map(FileResponse::owned).collect();
    responses.extend(shared.iter().map(FileResponse::shared));

    Ok(Json(ApiResponse::new(responses)))
}

/// PATCH /api/files/:id - Rename a file.
#[utoipa::path(
    patch,
    path = "/files/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File renamed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No edit access")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<RenameRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = state
        .file_service()
        .rename(file_id, claims.sub, &req.name)
        .await?;

    // A grantee editor gets their grant level back, not "owner"
    let response = if file.owner_id == claims.sub {
        FileResponse::owned(&file)
    } else {
        let permission = ShareRepository::new(state.db.pool())
            .get_for_grantee(file_id, claims.sub)
            .await?
            .map(|share| share.permission.to_string())
            .unwrap_or_else(|| "edit".to_string());
        FileResponse::with_permission(&file, permission)
    };

    Ok(Json(ApiResponse::new(response)))
}

/// DELETE /api/files/:id - Delete a file.
///
/// For the owner this moves the file to trash. For a recipient with
/// delete access it removes their own grant instead.
#[utoipa::path(
    delete,
    path = "/files/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No delete access")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let outcome = state.file_service().delete(file_id, claims.sub).await?;

    tracing::info!(user_id = claims.sub, file_id, ?outcome, "file deleted");

    Ok(Json(ApiResponse::new(outcome.into())))
}

/// GET /api/files/:id/download - Get a signed download link.
#[utoipa::path(
    get,
    path = "/files/{id}/download",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "Signed download link"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No read access"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_url(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<DownloadUrlResponse>>, ApiError> {
    // Access check happens here so the link itself can skip the database
    let result = state.file_service().download(file_id, claims.sub).await?;

    let token = state
        .jwt
        .issue_download_token(claims.sub, result.metadata.id, state.download_url_ttl)?;

    Ok(Json(ApiResponse::new(DownloadUrlResponse {
        url: format!(
            "/api/files/{}/content?token={}",
            file_id,
            urlencoding::encode(&token)
        ),
        expires_in: state.download_url_ttl,
    })))
}

/// GET /api/files/:id/content?token= - Download file content via a signed link.
#[utoipa::path(
    get,
    path = "/files/{id}/content",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID"),
        ("token" = String, Query, description = "Signed download token")
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 401, description = "Invalid or expired token"),
        (status = 404, description = "File not found")
    )
)]
pub async fn download_content(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i64>,
    Query(query): Query<DownloadTokenQuery>,
) -> Result<Response, ApiError> {
    let claims = state.jwt.verify_download_token(&query.token, file_id)?;

    let result = state.file_service().download(file_id, claims.sub).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, &result.metadata.mime_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&result.metadata.name),
        )
        .header(header::CONTENT_LENGTH, result.content.len())
        .body(Body::from(result.content))
        .map_err(|e| {
            tracing::error!("Failed to build download response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

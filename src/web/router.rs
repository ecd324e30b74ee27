//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    create_share, delete_file, download_content, download_url, events_ws_handler, list_files,
    list_shares, list_trash, login, me, purge_file, rename_file, restore_file, revoke_share,
    shared_by_me, update_share, upload_file, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth, JwtState};

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    cors_origins: &[String],
) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(login))
        .route("/me", get(me));

    let file_routes = Router::new()
        .route("/", post(upload_file).get(list_files))
        .route("/:id", axum::routing::patch(rename_file).delete(delete_file))
        .route("/:id/download", get(download_url))
        .route("/:id/content", get(download_content))
        .route("/:id/shares", post(create_share).get(list_shares))
        .route(
            "/:id/shares/:share_id",
            axum::routing::patch(update_share).delete(revoke_share),
        );

    let trash_routes = Router::new()
        .route("/", get(list_trash).delete(purge_file))
        .route("/restore", post(restore_file));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/files", file_routes)
        .nest("/trash", trash_routes)
        .route("/shared-by-me", get(shared_by_me))
        .route("/events/ws", get(events_ws_handler));

    // Uploads go through multipart; allow the configured maximum plus
    // some headroom for the multipart framing
    let body_limit = app_state.max_upload_size as usize + 64 * 1024;

    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::auth::login,
        super::handlers::auth::me,
        super::handlers::file::upload_file,
        super::handlers::file::list_files,
        super::handlers::file::rename_file,
        super::handlers::file::delete_file,
        super::handlers::file::download_url,
        super::handlers::file::download_content,
        super::handlers::trash::list_trash,
        super::handlers::trash::restore_file,
        super::handlers::trash::purge_file,
        super::handlers::share::create_share,
        super::handlers::share::list_shares,
        super::handlers::share::update_share,
        super::handlers::share::revoke_share,
        super::handlers::share::shared_by_me,
    ),
    tags(
        (name = "auth", description = "Authentication"),
        (name = "files", description = "File upload, download and lifecycle"),
        (name = "trash", description = "Trash and restore"),
        (name = "shares", description = "Sharing and permissions")
    )
)]
struct ApiDoc;

/// Create the Swagger UI router.
pub fn create_swagger_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

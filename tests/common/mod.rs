//! Test helpers for Web API integration tests.

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum_test::TestServer;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};
use tempfile::TempDir;

use filedock::notify::SessionRegistry;
use filedock::storage::LocalBlobStore;
use filedock::web::handlers::AppState;
use filedock::web::middleware::JwtState;
use filedock::web::router::{create_health_router, create_router};
use filedock::{Database, JwtIdentityVerifier};

/// Shared secret the fake identity provider signs with.
pub const IDENTITY_SECRET: &str = "test-identity-secret";
/// Issuer the server expects on identity tokens.
pub const IDENTITY_ISSUER: &str = "https://identity.test";

const JWT_SECRET: &str = "test-secret-key-for-testing-only";

/// Handle to a running test server and its backing state.
pub struct TestContext {
    pub server: TestServer,
    pub db: Arc<Database>,
    pub sessions: Arc<SessionRegistry>,
    _blob_dir: TempDir,
}

/// Create a test server with an in-memory database and temp blob storage.
pub async fn create_test_server() -> TestContext {
    let db = Arc::new(
        Database::open_in_memory()
            .await
            .expect("Failed to create test database"),
    );

    let blob_dir = TempDir::new().expect("Failed to create blob dir");
    let blob_store = Arc::new(
        LocalBlobStore::new(blob_dir.path()).expect("Failed to create blob store"),
    );

    let sessions = Arc::new(SessionRegistry::new());
    let jwt_state = Arc::new(JwtState::new(JWT_SECRET));

    let app_state = Arc::new(AppState {
        db: db.clone(),
        blob_store,
        sessions: sessions.clone(),
        identity_verifier: Arc::new(JwtIdentityVerifier::new(IDENTITY_SECRET, IDENTITY_ISSUER)),
        jwt: jwt_state.clone(),
        access_token_expiry: 900,
        download_url_ttl: 600,
        max_upload_size: 10 * 1024 * 1024,
    });

    let router = create_router(app_state, jwt_state, &[]).merge(create_health_router());

    let server = TestServer::new(router).expect("Failed to create test server");

    TestContext {
        server,
        db,
        sessions,
        _blob_dir: blob_dir,
    }
}

#[derive(Serialize)]
struct ProviderTestClaims<'a> {
    sub: &'a str,
    email: &'a str,
    name: &'a str,
    iss: &'a str,
    exp: u64,
}

/// Mint an identity token the way the provider would.
pub fn mint_identity_token(subject: &str, email: &str, name: &str) -> String {
    let claims = ProviderTestClaims {
        sub: subject,
        email,
        name,
        iss: IDENTITY_ISSUER,
        exp: (chrono::Utc::now().timestamp() + 3600) as u64,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(IDENTITY_SECRET.as_bytes()),
    )
    .expect("Failed to mint identity token")
}

/// Log a user in via the API and return the login response body.
pub async fn login(ctx: &TestContext, subject: &str, email: &str, name: &str) -> Value {
    let response = ctx
        .server
        .post("/api/auth/login")
        .json(&json!({ "id_token": mint_identity_token(subject, email, name) }))
        .await;

    response.assert_status_ok();
    response.json::<Value>()
}

/// Get the access token from a login response.
pub fn get_access_token(response: &Value) -> String {
    response["data"]["access_token"]
        .as_str()
        .expect("Missing access token")
        .to_string()
}

/// Get the user ID from a login response.
pub fn get_user_id(response: &Value) -> i64 {
    response["data"]["user"]["id"]
        .as_i64()
        .expect("Missing user id")
}

/// Log in and return just the access token.
pub async fn login_token(ctx: &TestContext, subject: &str, email: &str, name: &str) -> String {
    get_access_token(&login(ctx, subject, email, name).await)
}

/// Upload a file and return its ID.
pub async fn upload_file(ctx: &TestContext, token: &str, name: &str, content: &[u8]) -> i64 {
    let part = axum_test::multipart::Part::bytes(content.to_vec())
        .file_name(name)
        .mime_type("text/plain");
    let form = axum_test::multipart::MultipartForm::new().add_part("file", part);

    let response = ctx
        .server
        .post("/api/files")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .multipart(form)
        .await;

    response.assert_status_ok();
    response.json::<Value>()["data"]["id"]
        .as_i64()
        .expect("Missing file id")
}

/// Share a file with another user and return the share ID.
pub async fn share_file(
    ctx: &TestContext,
    owner_token: &str,
    file_id: i64,
    email: &str,
    permission: &str,
) -> i64 {
    let response = ctx
        .server
        .post(&format!("/api/files/{}/shares", file_id))
        .add_header(AUTHORIZATION, format!("Bearer {}", owner_token))
        .json(&json!({ "email": email, "permission": permission }))
        .await;

    response.assert_status_ok();
    response.json::<Value>()["data"]["id"]
        .as_i64()
        .expect("Missing share id")
}

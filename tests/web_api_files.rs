//! Web API File Tests
//!
//! Integration tests for upload, listing, search, rename, download.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{create_test_server, login_token, share_file, upload_file};

#[tokio::test]
async fn test_upload_and_list() {
    let ctx = create_test_server().await;
    let token = login_token(&ctx, "idp-alice", "alice@example.com", "Alice").await;

    let file_id = upload_file(&ctx, &token, "notes.txt", b"hello").await;

    let response = ctx
        .server
        .get("/api/files")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let files = body["data"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["id"].as_i64().unwrap(), file_id);
    assert_eq!(files[0]["name"], "notes.txt");
    assert_eq!(files[0]["size"], 5);
    assert_eq!(files[0]["permission"], "owner");
}

#[tokio::test]
async fn test_upload_requires_auth() {
    let ctx = create_test_server().await;

    let part = axum_test::multipart::Part::bytes(b"data".to_vec())
        .file_name("a.txt")
        .mime_type("text/plain");
    let form = axum_test::multipart::MultipartForm::new().add_part("file", part);

    let response = ctx.server.post("/api/files").multipart(form).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_is_per_user() {
    let ctx = create_test_server().await;
    let alice = login_token(&ctx, "idp-alice", "alice@example.com", "Alice").await;
    let bob = login_token(&ctx, "idp-bob", "bob@example.com", "Bob").await;

    upload_file(&ctx, &alice, "alice.txt", b"a").await;

    let response = ctx
        .server
        .get("/api/files")
        .add_header(AUTHORIZATION, format!("Bearer {}", bob))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let ctx = create_test_server().await;
    let token = login_token(&ctx, "idp-alice", "alice@example.com", "Alice").await;

    upload_file(&ctx, &token, "Quarterly Report.pdf", b"pdf").await;
    upload_file(&ctx, &token, "notes.txt", b"txt").await;

    let response = ctx
        .server
        .get("/api/files")
        .add_query_param("q", "report")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let files = body["data"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "Quarterly Report.pdf");
}

#[tokio::test]
async fn test_search_covers_shared_files() {
    let ctx = create_test_server().await;
    let alice = login_token(&ctx, "idp-alice", "alice@example.com", "Alice").await;
    let bob = login_token(&ctx, "idp-bob", "bob@example.com", "Bob").await;

    let file_id = upload_file(&ctx, &alice, "shared-report.pdf", b"pdf").await;
    share_file(&ctx, &alice, file_id, "bob@example.com", "read").await;

    let response = ctx
        .server
        .get("/api/files")
        .add_query_param("q", "REPORT")
        .add_header(AUTHORIZATION, format!("Bearer {}", bob))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let files = body["data"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["permission"], "read");
    assert_eq!(files[0]["owner_name"], "Alice");
}

#[tokio::test]
async fn test_rename_by_owner() {
    let ctx = create_test_server().await;
    let token = login_token(&ctx, "idp-alice", "alice@example.com", "Alice").await;
    let file_id = upload_file(&ctx, &token, "draft.txt", b"x").await;

    let response = ctx
        .server
        .patch(&format!("/api/files/{}", file_id))
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .json(&json!({ "name": "final.txt" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "final.txt");
}

#[tokio::test]
async fn test_rename_forbidden_for_reader() {
    let ctx = create_test_server().await;
    let alice = login_token(&ctx, "idp-alice", "alice@example.com", "Alice").await;
    let bob = login_token(&ctx, "idp-bob", "bob@example.com", "Bob").await;

    let file_id = upload_file(&ctx, &alice, "draft.txt", b"x").await;
    share_file(&ctx, &alice, file_id, "bob@example.com", "read").await;

    let response = ctx
        .server
        .patch(&format!("/api/files/{}", file_id))
        .add_header(AUTHORIZATION, format!("Bearer {}", bob))
        .json(&json!({ "name": "stolen.txt" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_rename_allowed_for_editor() {
    let ctx = create_test_server().await;
    let alice = login_token(&ctx, "idp-alice", "alice@example.com", "Alice").await;
    let bob = login_token(&ctx, "idp-bob", "bob@example.com", "Bob").await;

    let file_id = upload_file(&ctx, &alice, "draft.txt", b"x").await;
    share_file(&ctx, &alice, file_id, "bob@example.com", "edit").await;

    let response = ctx
        .server
        .patch(&format!("/api/files/{}", file_id))
        .add_header(AUTHORIZATION, format!("Bearer {}", bob))
        .json(&json!({ "name": "edited.txt" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "edited.txt");
    // The editor sees their own grant level, not the owner's view
    assert_eq!(body["data"]["permission"], "edit");
}

#[tokio::test]
async fn test_rename_validation() {
    let ctx = create_test_server().await;
    let token = login_token(&ctx, "idp-alice", "alice@example.com", "Alice").await;
    let file_id = upload_file(&ctx, &token, "draft.txt", b"x").await;

    let response = ctx
        .server
        .patch(&format!("/api/files/{}", file_id))
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .json(&json!({ "name": "   " }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_download_flow() {
    let ctx = create_test_server().await;
    let token = login_token(&ctx, "idp-alice", "alice@example.com", "Alice").await;
    let file_id = upload_file(&ctx, &token, "notes.txt", b"file body here").await;

    // Get a signed link
    let response = ctx
        .server
        .get(&format!("/api/files/{}/download", file_id))
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let url = body["data"]["url"].as_str().unwrap().to_string();
    assert!(url.contains("token="));

    // Fetch the content without an Authorization header
    let response = ctx.server.get(&url).await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"file body here");
    assert!(response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("notes.txt"));
}

#[tokio::test]
async fn test_download_link_is_file_bound() {
    let ctx = create_test_server().await;
    let token = login_token(&ctx, "idp-alice", "alice@example.com", "Alice").await;
    let first = upload_file(&ctx, &token, "a.txt", b"aaa").await;
    let second = upload_file(&ctx, &token, "b.txt", b"bbb").await;

    let response = ctx
        .server
        .get(&format!("/api/files/{}/download", first))
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await;
    let url = response.json::<Value>()["data"]["url"]
        .as_str()
        .unwrap()
        .to_string();

    // Swap the file ID in the signed URL
    let forged = url.replace(
        &format!("/api/files/{}/content", first),
        &format!("/api/files/{}/content", second),
    );

    let response = ctx.server.get(&forged).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_download_forbidden_without_grant() {
    let ctx = create_test_server().await;
    let alice = login_token(&ctx, "idp-alice", "alice@example.com", "Alice").await;
    let bob = login_token(&ctx, "idp-bob", "bob@example.com", "Bob").await;

    let file_id = upload_file(&ctx, &alice, "secret.txt", b"secret").await;

    let response = ctx
        .server
        .get(&format!("/api/files/{}/download", file_id))
        .add_header(AUTHORIZATION, format!("Bearer {}", bob))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reader_can_download() {
    let ctx = create_test_server().await;
    let alice = login_token(&ctx, "idp-alice", "alice@example.com", "Alice").await;
    let bob = login_token(&ctx, "idp-bob", "bob@example.com", "Bob").await;

    let file_id = upload_file(&ctx, &alice, "shared.txt", b"shared body").await;
    share_file(&ctx, &alice, file_id, "bob@example.com", "read").await;

    let response = ctx
        .server
        .get(&format!("/api/files/{}/download", file_id))
        .add_header(AUTHORIZATION, format!("Bearer {}", bob))
        .await;
    response.assert_status_ok();

    let url = response.json::<Value>()["data"]["url"]
        .as_str()
        .unwrap()
        .to_string();
    let response = ctx.server.get(&url).await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"shared body");
}

#[tokio::test]
async fn test_missing_file_looks_like_forbidden() {
    let ctx = create_test_server().await;
    let alice = login_token(&ctx, "idp-alice", "alice@example.com", "Alice").await;
    let bob = login_token(&ctx, "idp-bob", "bob@example.com", "Bob").await;

    let file_id = upload_file(&ctx, &alice, "secret.txt", b"secret").await;

    // Bob has no grant on Alice's file; someone else's file and a made-up
    // ID must be indistinguishable in every status code
    for id in [file_id, 999_999] {
        let response = ctx
            .server
            .get(&format!("/api/files/{}/download", id))
            .add_header(AUTHORIZATION, format!("Bearer {}", bob))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = ctx
            .server
            .patch(&format!("/api/files/{}", id))
            .add_header(AUTHORIZATION, format!("Bearer {}", bob))
            .json(&json!({ "name": "renamed.txt" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = ctx
            .server
            .delete(&format!("/api/files/{}", id))
            .add_header(AUTHORIZATION, format!("Bearer {}", bob))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = ctx
            .server
            .get(&format!("/api/files/{}/shares", id))
            .add_header(AUTHORIZATION, format!("Bearer {}", bob))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }
}

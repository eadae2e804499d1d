//! Integration tests for upload URLs, uploads, file metadata and
//! reference operations.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};

use stowage_core::traits::StorageProvider;
use stowage_entity::user::UserRole;

use crate::helpers::{BASE_URL, TestApp, TestResponse};

/// Ask for an upload URL and return the `data` object.
async fn upload_url(app: &TestApp, token: &str, file_name: &str) -> Value {
    let response = app
        .request(
            "POST",
            "/api/files/upload-url",
            Some(json!({
                "file_name": file_name,
                "content_type": "text/plain",
                "size_bytes": "11",
            })),
            Some(token),
        )
        .await;
    assert_eq!(
        response.status,
        StatusCode::CREATED,
        "upload-url failed: {:?}",
        response.body
    );
    response.body["data"].clone()
}

/// PUT `body` to a presigned URL.
async fn put_object(app: &TestApp, url: &str, content_type: &str, body: &str) -> TestResponse {
    let uri = url.strip_prefix(BASE_URL).expect("URL on the public base");
    let req = Request::builder()
        .method("PUT")
        .uri(uri)
        .header("Content-Type", content_type)
        .body(Body::from(body.to_string()))
        .expect("Failed to build request");
    app.send(req).await
}

/// Upload a small object and return its file ID.
async fn uploaded_file(app: &TestApp, token: &str) -> String {
    let data = upload_url(app, token, "notes.txt").await;
    let response = put_object(
        app,
        data["upload_url"].as_str().unwrap(),
        "text/plain",
        "hello world",
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    data["file"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_upload_flow_activates_file() {
    let app = TestApp::new().await;
    app.create_user("ivan", UserRole::Member).await;
    let token = app.login("ivan").await;

    let data = upload_url(&app, &token, "Quarterly Report.txt").await;
    assert_eq!(data["method"], "PUT");
    assert_eq!(data["headers"]["content-type"], "text/plain");
    assert_eq!(data["file"]["status"], "pending");
    assert_eq!(data["file"]["reference_count"], 0);
    let url = data["upload_url"].as_str().unwrap();
    assert!(url.starts_with(BASE_URL));
    let file_id = data["file"]["id"].as_str().unwrap();

    let response = put_object(&app, url, "text/plain; charset=utf-8", "hello world").await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["data"]["event_type"], "object_created");
    assert_eq!(response.body["data"]["status"], "completed");
    assert_eq!(response.body["data"]["replayed"], false);
    assert_eq!(response.body["data"]["result"]["outcome"], "applied");

    let response = app
        .request("GET", &format!("/api/files/{file_id}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "active");
    assert_eq!(response.body["data"]["size_bytes"], 11);

    let response = app.request("GET", "/api/files", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["total_items"], 1);
}

#[tokio::test]
async fn test_upload_url_is_single_use() {
    let app = TestApp::new().await;
    let token = app.login("admin").await;

    let data = upload_url(&app, &token, "once.txt").await;
    let url = data["upload_url"].as_str().unwrap();

    let first = put_object(&app, url, "text/plain", "first").await;
    assert_eq!(first.status, StatusCode::OK);

    let second = put_object(&app, url, "text/plain", "second").await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["message_key"], "upload.token_used");
}

#[tokio::test]
async fn test_upload_rejects_other_content_type() {
    let app = TestApp::new().await;
    let token = app.login("admin").await;

    let data = upload_url(&app, &token, "typed.txt").await;
    let response = put_object(
        &app,
        data["upload_url"].as_str().unwrap(),
        "application/octet-stream",
        "bytes",
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message_key"], "upload.content_type_mismatch");

    // The rejected attempt did not consume the URL.
    let response = put_object(
        &app,
        data["upload_url"].as_str().unwrap(),
        "text/plain",
        "bytes",
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_upload_after_delete_is_rejected() {
    let app = TestApp::new().await;
    let token = app.login("admin").await;

    let data = upload_url(&app, &token, "withdrawn.txt").await;
    let file_id = data["file"]["id"].as_str().unwrap();
    let file_path = data["file"]["file_path"].as_str().unwrap().to_string();

    let response = app
        .request("DELETE", &format!("/api/files/{file_id}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = put_object(
        &app,
        data["upload_url"].as_str().unwrap(),
        "text/plain",
        "hello world",
    )
    .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["message_key"], "file.deleted");

    let stored = app.state.storage.provider();
    assert!(!stored.exists(&file_path).await.unwrap());
}

#[tokio::test]
async fn test_upload_rejects_tampered_token() {
    let app = TestApp::new().await;
    let token = app.login("admin").await;

    let data = upload_url(&app, &token, "sealed.txt").await;
    let url = format!("{}x", data["upload_url"].as_str().unwrap());

    let response = put_object(&app, &url, "text/plain", "bytes").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_url_validation() {
    let app = TestApp::new().await;
    let token = app.login("admin").await;

    let response = app
        .request(
            "POST",
            "/api/files/upload-url",
            Some(json!({ "file_name": "", "content_type": "text/plain" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["details"]["file_name"].is_array());

    let response = app
        .request(
            "POST",
            "/api/files/upload-url",
            Some(json!({ "file_name": "a.txt", "content_type": "not a mime" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "POST",
            "/api/files/upload-url",
            Some(json!({
                "file_name": "huge.bin",
                "content_type": "application/octet-stream",
                "size_bytes": u64::MAX,
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message_key"], "file.too_large");
}

#[tokio::test]
async fn test_files_are_private_to_their_owner() {
    let app = TestApp::new().await;
    app.create_user("judy", UserRole::Member).await;
    app.create_user("mallory", UserRole::Member).await;
    let judy = app.login("judy").await;
    let mallory = app.login("mallory").await;
    let admin = app.login("admin").await;

    let file_id = uploaded_file(&app, &judy).await;
    let path = format!("/api/files/{file_id}");

    let response = app.request("GET", &path, None, Some(&mallory)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.request("DELETE", &path, None, Some(&mallory)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.request("GET", &path, None, Some(&admin)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.request("GET", "/api/files", None, Some(&mallory)).await;
    assert_eq!(response.body["data"]["total_items"], 0);
}

#[tokio::test]
async fn test_reference_operations_are_idempotent() {
    let app = TestApp::new().await;
    app.create_user("indexer", UserRole::Service).await;
    let admin = app.login("admin").await;
    let service = app.login("indexer").await;
    let file_id = uploaded_file(&app, &admin).await;

    let op = json!({
        "operation_id": "doc-42:attach",
        "file_id": file_id,
        "operation_type": "add_reference",
    });

    let first = app
        .request("POST", "/api/files/operations", Some(op.clone()), Some(&service))
        .await;
    assert_eq!(first.status, StatusCode::OK, "{:?}", first.body);
    assert_eq!(first.body["data"]["replayed"], false);
    assert_eq!(first.body["data"]["result"]["reference_count"], 1);

    let replay = app
        .request("POST", "/api/files/operations", Some(op), Some(&service))
        .await;
    assert_eq!(replay.status, StatusCode::OK);
    assert_eq!(replay.body["data"]["replayed"], true);
    assert_eq!(replay.body["data"]["result"]["reference_count"], 1);

    let reused = app
        .request(
            "POST",
            "/api/files/operations",
            Some(json!({
                "operation_id": "doc-42:attach",
                "file_id": file_id,
                "operation_type": "remove_reference",
            })),
            Some(&service),
        )
        .await;
    assert_eq!(reused.status, StatusCode::CONFLICT);
    assert_eq!(reused.body["message_key"], "file_operation.key_reused");

    let response = app
        .request("GET", &format!("/api/files/{file_id}"), None, Some(&admin))
        .await;
    assert_eq!(response.body["data"]["reference_count"], 1);

    // Referenced files cannot be deleted.
    let response = app
        .request("DELETE", &format!("/api/files/{file_id}"), None, Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["message_key"], "file.still_referenced");
}

#[tokio::test]
async fn test_reference_count_never_goes_negative() {
    let app = TestApp::new().await;
    let admin = app.login("admin").await;
    let file_id = uploaded_file(&app, &admin).await;

    let response = app
        .request(
            "POST",
            "/api/files/operations",
            Some(json!({
                "operation_id": "detach-without-attach",
                "file_id": file_id,
                "operation_type": "remove_reference",
            })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["message_key"], "file.reference_underflow");
}

#[tokio::test]
async fn test_members_cannot_report_operations() {
    let app = TestApp::new().await;
    app.create_user("kate", UserRole::Member).await;
    let token = app.login("kate").await;
    let file_id = uploaded_file(&app, &token).await;

    let response = app
        .request(
            "POST",
            "/api/files/operations",
            Some(json!({
                "operation_id": "op-1",
                "file_id": file_id,
                "operation_type": "add_reference",
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message_key"], "auth.service_required");
}

#[tokio::test]
async fn test_delete_unreferenced_file() {
    let app = TestApp::new().await;
    let token = app.login("admin").await;
    let file_id = uploaded_file(&app, &token).await;
    let path = format!("/api/files/{file_id}");

    let response = app.request("DELETE", &path, None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.request("GET", &path, None, Some(&token)).await;
    assert_eq!(response.body["data"]["status"], "deleted");

    let response = app.request("GET", "/api/files", None, Some(&token)).await;
    assert_eq!(response.body["data"]["total_items"], 0);

    // Deleting again is a no-op.
    let response = app.request("DELETE", &path, None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
}

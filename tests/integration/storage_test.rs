//! Integration tests for storage notifications, health and routing.

use axum::http::StatusCode;
use serde_json::json;

use stowage_entity::user::UserRole;

use crate::helpers::TestApp;

/// Register a pending file as `owner` and return `(file_id, file_path)`.
async fn pending_file(app: &TestApp, token: &str) -> (String, String) {
    let response = app
        .request(
            "POST",
            "/api/files/upload-url",
            Some(json!({ "file_name": "scan.pdf", "content_type": "application/pdf" })),
            Some(token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let file = &response.body["data"]["file"];
    (
        file["id"].as_str().unwrap().to_string(),
        file["file_path"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_storage_event_is_applied_once() {
    let app = TestApp::new().await;
    app.create_user("bucket-hook", UserRole::Service).await;
    let admin = app.login("admin").await;
    let service = app.login("bucket-hook").await;
    let (file_id, file_path) = pending_file(&app, &admin).await;

    let event = json!({
        "event_id": "s3:evt-0001",
        "file_path": file_path,
        "event_type": "object_created",
        "payload": "{\"size\": 2048}",
    });

    let first = app
        .request("POST", "/api/storage/events", Some(event.clone()), Some(&service))
        .await;
    assert_eq!(first.status, StatusCode::OK, "{:?}", first.body);
    assert_eq!(first.body["data"]["replayed"], false);
    assert_eq!(first.body["data"]["result"]["outcome"], "applied");
    assert_eq!(first.body["data"]["result"]["size_bytes"], 2048);
    let version = first.body["data"]["result"]["version"].clone();

    let replay = app
        .request("POST", "/api/storage/events", Some(event), Some(&service))
        .await;
    assert_eq!(replay.status, StatusCode::OK);
    assert_eq!(replay.body["data"]["replayed"], true);
    assert_eq!(replay.body["data"]["result"]["version"], version);

    let response = app
        .request("GET", &format!("/api/files/{file_id}"), None, Some(&admin))
        .await;
    assert_eq!(response.body["data"]["status"], "active");
    assert_eq!(response.body["data"]["size_bytes"], 2048);
    assert_eq!(response.body["data"]["version"], version);
}

#[tokio::test]
async fn test_event_for_unknown_path_is_ignored() {
    let app = TestApp::new().await;
    let admin = app.login("admin").await;

    let response = app
        .request(
            "POST",
            "/api/storage/events",
            Some(json!({
                "event_id": "s3:evt-stray",
                "file_path": "nobody/nothing/ghost.bin",
                "event_type": "object_created",
            })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "completed");
    assert_eq!(response.body["data"]["result"]["outcome"], "ignored");
    assert_eq!(response.body["data"]["result"]["reason"], "unknown_path");
}

#[tokio::test]
async fn test_object_deleted_event_marks_file_deleted() {
    let app = TestApp::new().await;
    let admin = app.login("admin").await;
    let (file_id, file_path) = pending_file(&app, &admin).await;

    let response = app
        .request(
            "POST",
            "/api/storage/events",
            Some(json!({
                "event_id": "s3:evt-del",
                "file_path": file_path,
                "event_type": "object_deleted",
            })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request("GET", &format!("/api/files/{file_id}"), None, Some(&admin))
        .await;
    assert_eq!(response.body["data"]["status"], "deleted");
}

#[tokio::test]
async fn test_members_cannot_report_events() {
    let app = TestApp::new().await;
    app.create_user("leo", UserRole::Member).await;
    let token = app.login("leo").await;

    let response = app
        .request(
            "POST",
            "/api/storage/events",
            Some(json!({
                "event_id": "evt",
                "file_path": "a/b/c",
                "event_type": "object_created",
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_event_type_is_rejected() {
    let app = TestApp::new().await;
    let admin = app.login("admin").await;

    let response = app
        .request(
            "POST",
            "/api/storage/events",
            Some(json!({
                "event_id": "evt",
                "file_path": "a/b/c",
                "event_type": "object_moved",
            })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message_key"], "validation.invalid_body");
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");

    let response = app.request("GET", "/api/health/ready", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["database"]["backend"], "memory");
    assert_eq!(response.body["data"]["database"]["healthy"], true);
    assert_eq!(response.body["data"]["storage"]["healthy"], true);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/nope", None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NOT_FOUND");
    assert_eq!(response.body["message_key"], "route.not_found");
}

//! Integration tests for account, group and lock administration.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use stowage_entity::user::UserRole;

use crate::helpers::{PASSWORD, TestApp};

#[tokio::test]
async fn test_admin_creates_and_lists_users() {
    let app = TestApp::new().await;
    let token = app.login("admin").await;

    let response = app
        .request(
            "POST",
            "/api/admin/users",
            Some(json!({
                "username": " dave ",
                "email": "dave@example.com",
                "password": PASSWORD,
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["username"], "dave");
    assert_eq!(response.body["data"]["role"], "member");
    assert_eq!(response.body["data"]["status"], "active");

    let response = app
        .request("GET", "/api/admin/users?search=dav&page=1&per_page=10", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["total_items"], 1);
    assert_eq!(response.body["data"]["items"][0]["username"], "dave");
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = TestApp::new().await;
    let token = app.login("admin").await;

    let response = app
        .request(
            "POST",
            "/api/admin/users",
            Some(json!({ "username": "admin", "password": PASSWORD })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_email_is_rejected() {
    let app = TestApp::new().await;
    let token = app.login("admin").await;

    let response = app
        .request(
            "POST",
            "/api/admin/users",
            Some(json!({
                "username": "erin",
                "email": "not-an-email",
                "password": PASSWORD,
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["details"]["email"][0], "Invalid email address");
}

#[tokio::test]
async fn test_members_cannot_use_admin_routes() {
    let app = TestApp::new().await;
    app.create_user("frank", UserRole::Member).await;
    let token = app.login("frank").await;

    let response = app
        .request("GET", "/api/admin/users", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message_key"], "auth.admin_required");

    let response = app
        .request("GET", "/api/admin/locks", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_disabled_account_cannot_login() {
    let app = TestApp::new().await;
    let grace = app.create_user("grace", UserRole::Member).await;
    let token = app.login("admin").await;

    let response = app
        .request(
            "PUT",
            &format!("/api/admin/users/{grace}/status"),
            Some(json!({ "status": "disabled" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "disabled");

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "grace", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message_key"], "auth.account_disabled");
}

#[tokio::test]
async fn test_admin_cannot_disable_self() {
    let app = TestApp::new().await;
    let data = app.login_full("admin").await;
    let token = data["access_token"].as_str().unwrap();
    let admin_id = data["user"]["id"].as_str().unwrap();

    let response = app
        .request(
            "PUT",
            &format!("/api/admin/users/{admin_id}/status"),
            Some(json!({ "status": "disabled" })),
            Some(token),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["message_key"], "user.cannot_disable_self");
}

#[tokio::test]
async fn test_malformed_id_is_a_validation_error() {
    let app = TestApp::new().await;
    let token = app.login("admin").await;

    let response = app
        .request(
            "PUT",
            "/api/admin/users/not-a-uuid/status",
            Some(json!({ "status": "active" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message_key"], "validation.invalid_id");
}

#[tokio::test]
async fn test_group_lifecycle() {
    let app = TestApp::new().await;
    let heidi = app.create_user("heidi", UserRole::Member).await;
    let token = app.login("admin").await;

    let response = app
        .request(
            "POST",
            "/api/admin/groups",
            Some(json!({
                "name": "storage-ops",
                "description": "Bucket operators",
                "permissions": ["locks.read"],
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let group_id = response.body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "POST",
            "/api/admin/groups",
            Some(json!({ "name": "storage-ops" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = app
        .request(
            "PUT",
            &format!("/api/admin/groups/{group_id}"),
            Some(json!({ "permissions": "[\"locks.read\", \"files.write\"]" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["name"], "storage-ops");
    assert_eq!(
        response.body["data"]["permissions"],
        json!(["locks.read", "files.write"])
    );

    let response = app
        .request(
            "POST",
            &format!("/api/admin/groups/{group_id}/members"),
            Some(json!({ "user_id": heidi })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let response = app
        .request(
            "GET",
            &format!("/api/admin/groups/{group_id}/members"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"][0]["user_account_id"], heidi.to_string());

    let response = app
        .request(
            "DELETE",
            &format!("/api/admin/groups/{group_id}/members/{heidi}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(
            "DELETE",
            &format!("/api/admin/groups/{group_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(
            "GET",
            &format!("/api/admin/groups/{group_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_active_locks_are_listed() {
    let app = TestApp::new().await;
    let token = app.login("admin").await;

    let lease = app
        .state
        .lock_service
        .acquire("reindex:bucket-a", Some(Duration::from_secs(120)))
        .await
        .unwrap()
        .expect("lock should be free");

    let response = app
        .request("GET", "/api/admin/locks", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let locks = response.body["data"].as_array().unwrap();
    assert_eq!(locks.len(), 1);
    assert_eq!(locks[0]["name"], "reindex:bucket-a");
    assert!(locks[0]["remaining_seconds"].as_i64().unwrap() > 100);

    assert!(app.state.lock_service.release(&lease).await.unwrap());
    let response = app
        .request("GET", "/api/admin/locks", None, Some(&token))
        .await;
    assert_eq!(response.body["data"], json!([]));
}

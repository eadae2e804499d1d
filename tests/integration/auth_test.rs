//! Integration tests for the authentication flow.

use axum::http::StatusCode;
use serde_json::json;

use stowage_entity::user::UserRole;

use crate::helpers::{PASSWORD, TestApp};

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new().await;
    app.create_user("alice", UserRole::Member).await;

    let data = app.login_full("alice").await;
    assert_eq!(data["token_type"], "Bearer");
    assert!(data["access_token"].as_str().is_some());
    assert!(data["refresh_token"].as_str().is_some());
    assert_eq!(data["user"]["username"], "alice");
    assert_eq!(data["user"]["role"], "member");
    assert!(data["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_login_invalid_password() {
    let app = TestApp::new().await;
    app.create_user("bob", UserRole::Member).await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "bob", "password": "wrong-password" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message_key"], "auth.invalid_credentials");
}

#[tokio::test]
async fn test_unknown_user_looks_like_bad_password() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "nobody", "password": PASSWORD })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message_key"], "auth.invalid_credentials");
}

#[tokio::test]
async fn test_lockout_after_repeated_failures() {
    let app = TestApp::new().await;
    app.create_user("carol", UserRole::Member).await;
    let attempts = app.state.config.auth.max_failed_attempts;

    for _ in 0..attempts {
        let response = app
            .request(
                "POST",
                "/api/auth/login",
                Some(json!({ "username": "carol", "password": "not-it" })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "carol", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.body["message_key"], "auth.locked_out");
}

#[tokio::test]
async fn test_missing_fields_are_validation_errors() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "   ", "password": "" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
    assert_eq!(response.body["details"]["username"][0], "Username is required");
    assert_eq!(response.body["details"]["password"][0], "Password is required");
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/auth/me", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request("GET", "/api/auth/me", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_returns_profile() {
    let app = TestApp::new().await;
    let token = app.login("admin").await;

    let response = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["username"], "admin");
    assert_eq!(response.body["data"]["role"], "admin");
    assert!(response.body["data"]["last_login_at"].is_string());
}

#[tokio::test]
async fn test_logout_revokes_access_token() {
    let app = TestApp::new().await;
    let token = app.login("admin").await;

    let response = app
        .request("POST", "/api/auth/logout", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message_key"], "auth.token_revoked");
}

#[tokio::test]
async fn test_refresh_rotates_and_detects_reuse() {
    let app = TestApp::new().await;
    let first = app.login_full("admin").await;
    let first_refresh = first["refresh_token"].as_str().unwrap().to_string();

    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": first_refresh })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let second_refresh = response.body["data"]["refresh_token"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(second_refresh, first_refresh);

    // Presenting the rotated token again revokes the whole family.
    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": first_refresh })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message_key"], "auth.refresh_token_reused");

    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": second_refresh })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_access_token_is_not_a_refresh_token() {
    let app = TestApp::new().await;
    let token = app.login("admin").await;

    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": token })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_jwks_is_served_for_hs256_as_empty_set() {
    let app = TestApp::new().await;

    let response = app
        .request("GET", "/.well-known/jwks.json", None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["keys"], json!([]));
}

//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use stowage_api::AppState;
use stowage_cache::CacheManager;
use stowage_core::config::{AppConfig, DatabaseProvider};
use stowage_database::Stores;
use stowage_entity::user::UserRole;
use stowage_service::user::CreateUserRequest;
use stowage_storage::providers::LocalStorageProvider;
use stowage_storage::{StorageManager, UploadTokenSigner};

/// Password that satisfies the strength rules.
pub const PASSWORD: &str = "Glacier-Harbor-Quiet-7!";

/// Base URL the local provider puts in upload URLs.
pub const BASE_URL: &str = "http://stowage.test";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for seeding and direct assertions
    pub state: AppState,
    /// Keeps the storage root alive for the test
    _storage_root: TempDir,
}

impl TestApp {
    /// Create a new test application with an `admin` account.
    pub async fn new() -> Self {
        let mut config = AppConfig::default();
        config.database.provider = DatabaseProvider::Memory;
        config.server.public_base_url = BASE_URL.to_string();
        config.auth.jwt_secret = "integration-test-secret".to_string();
        config.auth.argon2_memory_kib = 1024;
        config.auth.argon2_iterations = 1;
        config.worker.enabled = false;

        let storage_root = tempfile::tempdir().expect("Failed to create storage root");
        let signer = UploadTokenSigner::new("integration-upload-secret").expect("signer");
        let provider = LocalStorageProvider::new(
            &storage_root.path().to_string_lossy(),
            BASE_URL,
            signer.clone(),
        )
        .await
        .expect("Failed to init local storage");
        let storage = StorageManager::from_provider(Arc::new(provider), Some(signer));

        let cache = CacheManager::new(&config.cache)
            .await
            .expect("Failed to init cache");

        let state = AppState::from_parts(config, Stores::memory(), cache, storage)
            .expect("Failed to build state");
        let router = stowage_api::build_app(state.clone());

        let app = Self {
            router,
            state,
            _storage_root: storage_root,
        };
        app.create_user("admin", UserRole::Admin).await;
        app
    }

    /// Create an active account and return its ID
    pub async fn create_user(&self, username: &str, role: UserRole) -> Uuid {
        self.state
            .user_service
            .create_user(CreateUserRequest {
                username: username.to_string(),
                email: Some(format!("{username}@example.com")),
                password: PASSWORD.to_string(),
                display_name: None,
                role,
            })
            .await
            .expect("Failed to create test user")
            .id
    }

    /// Login and return the `data` object of the response
    pub async fn login_full(&self, username: &str) -> Value {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({
                    "username": username,
                    "password": PASSWORD,
                })),
                None,
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );
        response.body["data"].clone()
    }

    /// Login and return the access token
    pub async fn login(&self, username: &str) -> String {
        self.login_full(username).await["access_token"]
            .as_str()
            .expect("No access_token in login response")
            .to_string()
    }

    /// Make a JSON request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// Send a prepared request
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

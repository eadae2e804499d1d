//! Route definitions for the Stowage HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`, except the
//! JWKS document which lives at its well-known location.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use stowage_core::error::AppError;

use crate::error::ApiError;
use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    let upload_limit =
        usize::try_from(state.config.storage.max_upload_size_bytes).unwrap_or(usize::MAX);

    let api_routes = Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .merge(admin_routes())
        .merge(file_routes())
        .merge(storage_routes())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::timeout::request_timeout,
        ))
        .layer(DefaultBodyLimit::max(body_limit));

    // Uploads stream large bodies and are exempt from the request deadline.
    let upload_routes = Router::new()
        .route(
            "/storage/objects/{*path}",
            put(handlers::storage::upload_object),
        )
        .layer(RequestBodyLimitLayer::new(upload_limit));

    Router::new()
        .nest("/api", api_routes.merge(upload_routes))
        .route("/.well-known/jwks.json", get(handlers::jwks::jwks))
        .fallback(route_not_found)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

async fn route_not_found() -> ApiError {
    ApiError(AppError::not_found("Route not found").with_key("route.not_found"))
}

/// Liveness and readiness
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/ready", get(handlers::health::ready))
}

/// Auth endpoints: login, refresh, logout, me
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
}

/// Admin endpoints: accounts, groups, locks
fn admin_routes() -> Router<AppState> {
    use handlers::admin::{groups, locks, users};

    Router::new()
        .route(
            "/admin/users",
            get(users::list_users).post(users::create_user),
        )
        .route("/admin/users/{id}/status", put(users::update_user_status))
        .route(
            "/admin/groups",
            get(groups::list_groups).post(groups::create_group),
        )
        .route(
            "/admin/groups/{id}",
            get(groups::get_group)
                .put(groups::update_group)
                .delete(groups::delete_group),
        )
        .route(
            "/admin/groups/{id}/members",
            get(groups::list_members).post(groups::add_member),
        )
        .route(
            "/admin/groups/{id}/members/{user_id}",
            axum::routing::delete(groups::remove_member),
        )
        .route("/admin/locks", get(locks::list_locks))
}

/// File metadata, upload URLs and reference operations
fn file_routes() -> Router<AppState> {
    use handlers::file;

    Router::new()
        .route("/files", get(file::list_files))
        .route("/files/upload-url", post(file::create_upload_url))
        .route("/files/operations", post(file::create_operation))
        .route("/files/{id}", get(file::get_file).delete(file::delete_file))
}

/// Storage notifications
fn storage_routes() -> Router<AppState> {
    Router::new().route("/storage/events", post(handlers::storage::report_event))
}

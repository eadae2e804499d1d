//! Health check handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use stowage_core::traits::CacheProvider;

use crate::dto::response::{ApiResponse, DependencyStatus, HealthResponse, ReadinessResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// GET /api/health/ready
pub async fn ready(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<ReadinessResponse>>) {
    let database = DependencyStatus {
        backend: state.stores.backend_name().to_string(),
        healthy: state.stores.health_check().await.unwrap_or(false),
    };
    let cache = DependencyStatus {
        backend: state.cache.provider_name().to_string(),
        healthy: state.cache.health_check().await.unwrap_or(false),
    };
    let storage = DependencyStatus {
        backend: state.storage.provider().provider_type().to_string(),
        healthy: state.storage.health_check().await,
    };

    let ready = database.healthy && cache.healthy && storage.healthy;
    let status = if ready {
        StatusCode::OK
    } else {
        tracing::warn!(
            database = database.healthy,
            cache = cache.healthy,
            storage = storage.healthy,
            "Readiness check failed"
        );
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse {
            success: ready,
            data: ReadinessResponse {
                status: if ready { "ok" } else { "degraded" }.to_string(),
                database,
                cache,
                storage,
            },
        }),
    )
}

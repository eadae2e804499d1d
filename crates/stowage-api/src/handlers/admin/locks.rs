//! Lock inspection.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, LockResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::middleware::rbac::require_admin;
use crate::state::AppState;

/// GET /api/admin/locks
pub async fn list_locks(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<LockResponse>>>, ApiError> {
    require_admin(&auth)?;
    let locks = state.lock_service.list_active().await?;
    Ok(Json(ApiResponse::ok(
        locks.into_iter().map(LockResponse::from).collect(),
    )))
}

//! Admin account management handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum_extra::extract::WithRejection;

use stowage_core::types::pagination::PageResponse;
use stowage_entity::user::UserRole;
use stowage_service::user::service::CreateUserRequest as CreateUser;

use crate::dto::request::{CreateUserRequest, UpdateUserStatusRequest};
use crate::dto::response::{ApiResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::path::parse_uuid;
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::middleware::rbac::require_admin;
use crate::state::AppState;

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Query(params), _): WithRejection<Query<PaginationParams>, ApiError>,
) -> Result<Json<ApiResponse<PageResponse<UserResponse>>>, ApiError> {
    require_admin(&auth)?;

    let users = state
        .user_service
        .list_users(params.search.as_deref(), &params.page_request())
        .await?;

    Ok(Json(ApiResponse::ok(users.map(UserResponse::from))))
}

/// POST /api/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    require_admin(&auth)?;

    let user = state
        .user_service
        .create_user(CreateUser {
            username: req.username,
            email: req.email,
            password: req.password,
            display_name: req.display_name,
            role: req.role.unwrap_or(UserRole::Member),
        })
        .await?;
    tracing::info!(actor = %auth.user_id, user_id = %user.id, "Admin created account");

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user.into()))))
}

/// PUT /api/admin/users/{id}/status
pub async fn update_user_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateUserStatusRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    require_admin(&auth)?;
    let id = parse_uuid(&id)?;

    let user = state
        .user_service
        .set_status_as(&auth, id, req.status)
        .await?;

    Ok(Json(ApiResponse::ok(user.into())))
}

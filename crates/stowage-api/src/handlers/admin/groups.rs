//! Admin group handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum_extra::extract::WithRejection;

use stowage_core::types::pagination::PageResponse;
use stowage_entity::admin_group::{AdminGroup, AdminGroupMember, UpdateAdminGroup};
use stowage_service::admin_group::service::CreateAdminGroupRequest as CreateGroup;

use crate::dto::request::{AddGroupMemberRequest, CreateAdminGroupRequest, UpdateAdminGroupRequest};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::path::parse_uuid;
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::middleware::rbac::require_admin;
use crate::state::AppState;

/// GET /api/admin/groups
pub async fn list_groups(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Query(params), _): WithRejection<Query<PaginationParams>, ApiError>,
) -> Result<Json<ApiResponse<PageResponse<AdminGroup>>>, ApiError> {
    require_admin(&auth)?;
    let groups = state
        .admin_group_service
        .list(params.search.as_deref(), &params.page_request())
        .await?;
    Ok(Json(ApiResponse::ok(groups)))
}

/// POST /api/admin/groups
pub async fn create_group(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateAdminGroupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AdminGroup>>), ApiError> {
    require_admin(&auth)?;
    let group = state
        .admin_group_service
        .create(
            &auth,
            CreateGroup {
                name: req.name,
                description: req.description,
                permissions: req.permissions,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(group))))
}

/// GET /api/admin/groups/{id}
pub async fn get_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AdminGroup>>, ApiError> {
    require_admin(&auth)?;
    let group = state.admin_group_service.get(parse_uuid(&id)?).await?;
    Ok(Json(ApiResponse::ok(group)))
}

/// PUT /api/admin/groups/{id}
pub async fn update_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateAdminGroupRequest>,
) -> Result<Json<ApiResponse<AdminGroup>>, ApiError> {
    require_admin(&auth)?;
    let group = state
        .admin_group_service
        .update(
            parse_uuid(&id)?,
            UpdateAdminGroup {
                name: req.name,
                description: req.description,
                permissions: req.permissions,
            },
        )
        .await?;
    Ok(Json(ApiResponse::ok(group)))
}

/// DELETE /api/admin/groups/{id}
pub async fn delete_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    require_admin(&auth)?;
    state.admin_group_service.delete(parse_uuid(&id)?).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Admin group deleted"))))
}

/// GET /api/admin/groups/{id}/members
pub async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<AdminGroupMember>>>, ApiError> {
    require_admin(&auth)?;
    let members = state
        .admin_group_service
        .list_members(parse_uuid(&id)?)
        .await?;
    Ok(Json(ApiResponse::ok(members)))
}

/// POST /api/admin/groups/{id}/members
pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<AddGroupMemberRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AdminGroupMember>>), ApiError> {
    require_admin(&auth)?;
    let member = state
        .admin_group_service
        .add_member(parse_uuid(&id)?, req.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(member))))
}

/// DELETE /api/admin/groups/{id}/members/{user_id}
pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    require_admin(&auth)?;
    state
        .admin_group_service
        .remove_member(parse_uuid(&id)?, parse_uuid(&user_id)?)
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Member removed"))))
}

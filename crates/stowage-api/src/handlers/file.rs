//! File handlers: upload URLs, metadata, deletion, reference operations.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum_extra::extract::WithRejection;

use stowage_core::types::pagination::PageResponse;
use stowage_entity::file::NewFileOperation;

use crate::dto::request::{FileOperationRequest, UploadUrlRequest};
use crate::dto::response::{
    ApiResponse, FileOperationResponse, FileResponse, MessageResponse, UploadUrlResponse,
};
use crate::error::ApiError;
use crate::extractors::path::parse_uuid;
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::middleware::rbac::require_storage_reporter;
use crate::state::AppState;

/// POST /api/files/upload-url
pub async fn create_upload_url(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<UploadUrlRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UploadUrlResponse>>), ApiError> {
    let upload = state
        .file_service
        .generate_upload_url(&auth, &req.file_name, &req.content_type, req.size_bytes)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(upload.into()))))
}

/// GET /api/files
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Query(params), _): WithRejection<Query<PaginationParams>, ApiError>,
) -> Result<Json<ApiResponse<PageResponse<FileResponse>>>, ApiError> {
    let files = state
        .file_service
        .list_files(&auth, &params.page_request())
        .await?;
    Ok(Json(ApiResponse::ok(files.map(FileResponse::from))))
}

/// GET /api/files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = state.file_service.get_file(&auth, parse_uuid(&id)?).await?;
    Ok(Json(ApiResponse::ok(file.into())))
}

/// DELETE /api/files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .file_service
        .delete_file(&auth, parse_uuid(&id)?)
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("File deleted"))))
}

/// POST /api/files/operations
///
/// Replays of a completed `operation_id` return the stored result with
/// `replayed: true` and do not change the reference count again.
pub async fn create_operation(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<FileOperationRequest>,
) -> Result<Json<ApiResponse<FileOperationResponse>>, ApiError> {
    require_storage_reporter(&auth)?;

    let outcome = state
        .operation_processor
        .process(NewFileOperation {
            operation_id: req.operation_id,
            file_id: req.file_id,
            operation_type: req.operation_type,
            requested_by: Some(auth.user_id),
        })
        .await?;

    Ok(Json(ApiResponse::ok(outcome.into())))
}

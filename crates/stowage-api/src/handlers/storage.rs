//! Storage notifications and the local provider's upload endpoint.

use std::time::Duration;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use axum_extra::extract::WithRejection;
use chrono::Utc;
use futures::TryStreamExt;
use serde_json::json;
use tracing::{info, warn};

use stowage_cache::keys;
use stowage_core::error::AppError;
use stowage_core::traits::CacheProvider;
use stowage_entity::file::{FileEventType, FileStatus, NewFileEvent};

use crate::dto::request::{StorageEventRequest, UploadTokenQuery};
use crate::dto::response::{ApiResponse, StorageEventResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::middleware::rbac::require_storage_reporter;
use crate::state::AppState;

/// POST /api/storage/events
pub async fn report_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<StorageEventRequest>,
) -> Result<Json<ApiResponse<StorageEventResponse>>, ApiError> {
    require_storage_reporter(&auth)?;

    let outcome = state
        .event_processor
        .process(NewFileEvent {
            event_id: req.event_id,
            file_path: req.file_path,
            event_type: req.event_type,
            payload: req.payload,
        })
        .await?;

    Ok(Json(ApiResponse::ok(outcome.into())))
}

/// `text/plain; charset=utf-8` -> `text/plain`.
fn mime_essence(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

/// PUT /api/storage/objects/{*path}?token=...
///
/// Streams the body to the local provider, then records an
/// `object_created` event the same way a bucket notification would. Each
/// upload token is accepted once.
pub async fn upload_object(
    State(state): State<AppState>,
    Path(path): Path<String>,
    WithRejection(Query(query), _): WithRejection<Query<UploadTokenQuery>, ApiError>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<ApiResponse<StorageEventResponse>>, ApiError> {
    let path = path.trim_start_matches('/').to_string();
    let claims = state
        .storage
        .require_upload_signer()?
        .verify(&query.token, &path)?;

    if let Some(sent) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
        && !mime_essence(sent).eq_ignore_ascii_case(mime_essence(&claims.content_type))
    {
        return Err(AppError::validation(format!(
            "Content-Type '{sent}' does not match the declared '{}'",
            claims.content_type
        ))
        .with_key("upload.content_type_mismatch")
        .into());
    }

    let file = state.file_service.find_by_path(&path).await?;
    if file.status == FileStatus::Deleted {
        return Err(AppError::unprocessable("File has been deleted")
            .with_key("file.deleted")
            .into());
    }

    let used_key = keys::upload_token_used(claims.jti);
    let remaining = (claims.exp - Utc::now().timestamp()).max(1) as u64;
    if !state
        .cache
        .set_nx(&used_key, &file.id.to_string(), Duration::from_secs(remaining))
        .await?
    {
        return Err(AppError::conflict("Upload URL has already been used")
            .with_key("upload.token_used")
            .into());
    }

    let stream = body.into_data_stream().map_err(std::io::Error::other);
    let written = match state
        .storage
        .provider()
        .write_stream(&path, Box::pin(stream))
        .await
    {
        Ok(written) => written,
        Err(e) => {
            // Let the client retry with the same URL.
            if let Err(release) = state.cache.delete(&used_key).await {
                warn!(error = %release, "Failed to release upload token");
            }
            return Err(e.into());
        }
    };
    info!(file_id = %file.id, file_path = %path, bytes = written, "Object uploaded");

    let outcome = state
        .event_processor
        .process(NewFileEvent {
            event_id: format!("upload:{}", claims.jti),
            file_path: path,
            event_type: FileEventType::ObjectCreated,
            payload: Some(json!({
                "size_bytes": written,
                "content_type": claims.content_type,
            })),
        })
        .await?;

    Ok(Json(ApiResponse::ok(outcome.into())))
}

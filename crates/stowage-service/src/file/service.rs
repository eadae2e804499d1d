//! File registration, listing and deletion.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use stowage_core::config::storage::StorageConfig;
use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::traits::storage::PresignedUpload;
use stowage_core::types::pagination::{PageRequest, PageResponse};
use stowage_database::traits::FileStore;
use stowage_entity::file::{File, FileStatus, NewFile};
use stowage_storage::StorageManager;

use crate::context::RequestContext;

use super::naming;

/// A freshly registered file and the URL to upload its bytes to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadUrl {
    /// The pending file record.
    pub file: File,
    /// Where and how to upload.
    pub upload: PresignedUpload,
}

/// Handles file bookkeeping and storage access for end users.
#[derive(Debug, Clone)]
pub struct FileService {
    files: Arc<dyn FileStore>,
    storage: StorageManager,
    max_upload_size_bytes: u64,
    upload_url_ttl: Duration,
}

fn file_not_found() -> AppError {
    AppError::not_found("File not found").with_key("file.not_found")
}

fn validate_content_type(content_type: &str) -> AppResult<()> {
    let valid = content_type
        .split_once('/')
        .is_some_and(|(kind, sub)| !kind.is_empty() && !sub.is_empty())
        && !content_type.chars().any(|c| c.is_whitespace() || c.is_control());
    if valid {
        return Ok(());
    }
    Err(AppError::validation(format!("Invalid content type '{content_type}'"))
        .with_key("validation.content_type")
        .with_details(serde_json::json!({ "content_type": ["invalid format"] })))
}

impl FileService {
    /// Creates a new file service.
    pub fn new(files: Arc<dyn FileStore>, storage: StorageManager, config: &StorageConfig) -> Self {
        Self {
            files,
            storage,
            max_upload_size_bytes: config.max_upload_size_bytes,
            upload_url_ttl: Duration::from_secs(config.upload_url_ttl_seconds),
        }
    }

    /// Register a pending file and return a URL for uploading its content.
    pub async fn generate_upload_url(
        &self,
        ctx: &RequestContext,
        file_name: &str,
        content_type: &str,
        size_bytes: Option<u64>,
    ) -> AppResult<UploadUrl> {
        let content_type = content_type.trim();
        validate_content_type(content_type)?;
        if let Some(size) = size_bytes
            && size > self.max_upload_size_bytes
        {
            return Err(AppError::validation(format!(
                "File size {size} exceeds the maximum of {} bytes",
                self.max_upload_size_bytes
            ))
            .with_key("file.too_large")
            .with_details(serde_json::json!({ "size_bytes": ["exceeds maximum upload size"] })));
        }

        let file = self
            .files
            .create(&NewFile {
                file_path: naming::object_key(ctx.user_id, file_name),
                owner_id: ctx.user_id,
                content_type: content_type.to_string(),
                size_bytes: size_bytes.and_then(|s| i64::try_from(s).ok()),
            })
            .await?;

        let upload = self
            .storage
            .provider()
            .presign_upload(&file.file_path, &file.content_type, self.upload_url_ttl)
            .await?;

        info!(
            file_id = %file.id,
            file_path = %file.file_path,
            owner_id = %file.owner_id,
            "Upload URL issued"
        );
        Ok(UploadUrl { file, upload })
    }

    /// Get a file the caller owns (admins see every file).
    pub async fn get_file(&self, ctx: &RequestContext, id: Uuid) -> AppResult<File> {
        let file = self.files.find_by_id(id).await?.ok_or_else(file_not_found)?;
        if !ctx.can_access_owned(file.owner_id) {
            return Err(AppError::authorization("You do not have access to this file")
                .with_key("file.forbidden"));
        }
        Ok(file)
    }

    /// List the caller's files that are not deleted.
    pub async fn list_files(
        &self,
        ctx: &RequestContext,
        page: &PageRequest,
    ) -> AppResult<PageResponse<File>> {
        self.files.list_by_owner(ctx.user_id, &page.normalized()).await
    }

    /// Delete a file that nothing references.
    ///
    /// The record moves to `deleted` first so a concurrent reference
    /// operation sees the new version and fails, then the object is removed.
    pub async fn delete_file(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        let file = self.get_file(ctx, id).await?;
        if file.status == FileStatus::Deleted {
            return Ok(());
        }
        if file.is_referenced() {
            return Err(AppError::conflict(format!(
                "File is still referenced {} time(s)",
                file.reference_count
            ))
            .with_key("file.still_referenced"));
        }

        self.files
            .update_status(file.id, FileStatus::Deleted, file.version)
            .await?
            .ok_or_else(|| {
                AppError::conflict("File was modified concurrently, retry the request")
                    .with_key("file.version_conflict")
            })?;

        if let Err(e) = self.storage.provider().delete(&file.file_path).await {
            warn!(file_id = %file.id, file_path = %file.file_path, error = %e, "Failed to delete object");
        }
        info!(file_id = %file.id, actor = %ctx.user_id, "File deleted");
        Ok(())
    }

    /// Find a file by object key.
    pub async fn find_by_path(&self, file_path: &str) -> AppResult<File> {
        self.files
            .find_by_path(file_path)
            .await?
            .ok_or_else(file_not_found)
    }

    /// The storage manager backing this service.
    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }
}

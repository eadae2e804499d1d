//! Local filesystem storage provider.
//!
//! Objects live under a root directory. Uploads go through the server's own
//! `PUT /api/storage/objects/{*path}` endpoint, authorized by a signed
//! upload token embedded in the presigned URL.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_core::traits::storage::{ByteStream, PresignedUpload, StorageProvider};

use crate::upload_token::UploadTokenSigner;

/// Route prefix the API mounts the object upload endpoint under.
pub const OBJECT_ROUTE_PREFIX: &str = "/api/storage/objects";

/// Local filesystem storage provider.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    /// Root directory for all stored objects.
    root: PathBuf,
    /// Externally reachable base URL used in presigned URLs.
    public_base_url: String,
    /// Signs upload tokens.
    signer: UploadTokenSigner,
}

impl LocalStorageProvider {
    /// Create a new local storage provider rooted at the given path.
    pub async fn new(
        root_path: &str,
        public_base_url: &str,
        signer: UploadTokenSigner,
    ) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            signer,
        })
    }

    /// Token signer shared with the upload endpoint.
    pub fn signer(&self) -> &UploadTokenSigner {
        &self.signer
    }

    /// Resolve an object key to an absolute path within the root.
    ///
    /// Keys containing `..`, empty segments or absolute components are
    /// rejected so that nothing escapes the root.
    fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        let clean = path.trim_start_matches('/');
        if clean.is_empty() || clean.split('/').any(str::is_empty) {
            return Err(AppError::validation(format!("Invalid object path: {path}"))
                .with_key("storage.invalid_path"));
        }

        let relative = Path::new(clean);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::validation(format!("Invalid object path: {path}"))
                .with_key("storage.invalid_path"));
        }

        Ok(self.root.join(relative))
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false))
    }

    async fn write_stream(&self, path: &str, mut stream: ByteStream) -> AppResult<u64> {
        let full_path = self.resolve(path)?;
        self.ensure_parent(&full_path).await?;

        let mut file = fs::File::create(&full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create file: {path}"),
                e,
            )
        })?;

        let mut total_bytes = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    let _ = fs::remove_file(&full_path).await;
                    return Err(AppError::with_source(
                        ErrorKind::Storage,
                        "Stream read error",
                        e,
                    ));
                }
            };
            total_bytes += chunk.len() as u64;
            file.write_all(&chunk).await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to write chunk", e)
            })?;
        }

        file.flush()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush file", e))?;

        debug!(path, bytes = total_bytes, "Wrote object from stream");
        Ok(total_bytes)
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!(path, "Deleted object");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete file: {path}"),
                e,
            )),
        }
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        let full_path = self.resolve(path)?;
        Ok(fs::try_exists(&full_path).await.unwrap_or(false))
    }

    async fn presign_upload(
        &self,
        path: &str,
        content_type: &str,
        ttl: Duration,
    ) -> AppResult<PresignedUpload> {
        self.resolve(path)?;
        let (token, expires_at) = self.signer.sign(path, content_type, ttl)?;

        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), content_type.to_string());

        Ok(PresignedUpload {
            url: format!(
                "{}{}/{}?token={}",
                self.public_base_url,
                OBJECT_ROUTE_PREFIX,
                path.trim_start_matches('/'),
                token
            ),
            method: "PUT".to_string(),
            headers,
            expires_at,
        })
    }
}

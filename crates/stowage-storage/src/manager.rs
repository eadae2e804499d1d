//! Storage manager: builds the configured provider and exposes it to the
//! services and the API.

use std::sync::Arc;

use tracing::info;

use stowage_core::config::storage::{StorageBackend, StorageConfig};
use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::traits::storage::StorageProvider;

use crate::upload_token::UploadTokenSigner;

/// Holds the active storage provider.
#[derive(Debug, Clone)]
pub struct StorageManager {
    provider: Arc<dyn StorageProvider>,
    /// Present when uploads are served by this process (local provider).
    upload_signer: Option<UploadTokenSigner>,
}

impl StorageManager {
    /// Build the provider selected by `config.provider`.
    ///
    /// `public_base_url` is the externally reachable server address used in
    /// local upload URLs.
    pub async fn from_config(config: &StorageConfig, public_base_url: &str) -> AppResult<Self> {
        match config.provider {
            StorageBackend::Local => Self::local(config, public_base_url).await,
            StorageBackend::S3 => Self::s3(config).await,
        }
    }

    #[cfg(feature = "local")]
    async fn local(config: &StorageConfig, public_base_url: &str) -> AppResult<Self> {
        let signer = UploadTokenSigner::new(&config.local.signing_secret)?;
        let provider = crate::providers::LocalStorageProvider::new(
            &config.local.root_path,
            public_base_url,
            signer.clone(),
        )
        .await?;
        info!(root = %config.local.root_path, "Local storage provider initialized");
        Ok(Self {
            provider: Arc::new(provider),
            upload_signer: Some(signer),
        })
    }

    #[cfg(not(feature = "local"))]
    async fn local(_config: &StorageConfig, _public_base_url: &str) -> AppResult<Self> {
        Err(AppError::configuration(
            "Local storage support is not compiled in (enable the `local` feature)",
        ))
    }

    #[cfg(feature = "s3")]
    async fn s3(config: &StorageConfig) -> AppResult<Self> {
        let provider = crate::providers::S3StorageProvider::new(&config.s3).await?;
        info!(bucket = %config.s3.bucket, region = %config.s3.region, "S3 storage provider initialized");
        Ok(Self {
            provider: Arc::new(provider),
            upload_signer: None,
        })
    }

    #[cfg(not(feature = "s3"))]
    async fn s3(_config: &StorageConfig) -> AppResult<Self> {
        Err(AppError::configuration(
            "S3 storage support is not compiled in (enable the `s3` feature)",
        ))
    }

    /// Wrap an existing provider (used by tests).
    pub fn from_provider(
        provider: Arc<dyn StorageProvider>,
        upload_signer: Option<UploadTokenSigner>,
    ) -> Self {
        Self {
            provider,
            upload_signer,
        }
    }

    /// The active provider.
    pub fn provider(&self) -> Arc<dyn StorageProvider> {
        Arc::clone(&self.provider)
    }

    /// Signer for server-handled uploads, if the active provider uses them.
    pub fn upload_signer(&self) -> Option<&UploadTokenSigner> {
        self.upload_signer.as_ref()
    }

    /// Signer for server-handled uploads, or an error when the provider
    /// expects clients to upload elsewhere.
    pub fn require_upload_signer(&self) -> AppResult<&UploadTokenSigner> {
        self.upload_signer.as_ref().ok_or_else(|| {
            AppError::not_found("Direct uploads are not served by this storage provider")
                .with_key("storage.direct_upload_unsupported")
        })
    }

    /// Check whether the active provider is reachable.
    pub async fn health_check(&self) -> bool {
        self.provider.health_check().await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::error::ErrorKind;

    #[tokio::test]
    async fn test_local_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StorageConfig::default();
        config.local.root_path = dir.path().to_string_lossy().to_string();

        let manager = StorageManager::from_config(&config, "http://localhost:8080")
            .await
            .unwrap();

        assert_eq!(manager.provider().provider_type(), "local");
        assert!(manager.upload_signer().is_some());
        assert!(manager.health_check().await);
    }

    #[tokio::test]
    async fn test_s3_without_bucket_fails() {
        let mut config = StorageConfig::default();
        config.provider = StorageBackend::S3;

        let err = StorageManager::from_config(&config, "http://localhost:8080")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}

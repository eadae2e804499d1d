//! Storage provider trait for pluggable object storage backends.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// A byte stream type used for streaming object contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// A time-limited URL the client uses to upload an object directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignedUpload {
    /// Upload URL.
    pub url: String,
    /// HTTP method the client must use.
    pub method: String,
    /// Headers the client must send with the upload.
    pub headers: BTreeMap<String, String>,
    /// When the URL stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// Trait for object storage backends.
///
/// Implementations exist for the local filesystem and S3. Paths are
/// slash-separated object keys relative to the provider root.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Write a byte stream to the object at `path`, returning bytes written.
    async fn write_stream(&self, path: &str, stream: ByteStream) -> AppResult<u64>;

    /// Delete the object at `path`. Deleting a missing object succeeds.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Check whether an object exists at `path`.
    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// Produce an upload URL for `path` that is valid for `ttl`.
    async fn presign_upload(
        &self,
        path: &str,
        content_type: &str,
        ttl: Duration,
    ) -> AppResult<PresignedUpload>;
}

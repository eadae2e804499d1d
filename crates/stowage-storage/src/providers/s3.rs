//! S3-compatible storage provider using the AWS SDK.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::presigning::PresigningConfig;
use bytes::BytesMut;
use chrono::Utc;
use futures::stream::StreamExt;
use tracing::{debug, instrument};

use stowage_core::config::storage::S3StorageConfig;
use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_core::traits::storage::{ByteStream, PresignedUpload, StorageProvider};

/// S3-compatible object storage provider.
#[derive(Clone)]
pub struct S3StorageProvider {
    client: Client,
    bucket: String,
    endpoint: Option<String>,
    region: String,
}

impl std::fmt::Debug for S3StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3StorageProvider")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl S3StorageProvider {
    /// Build a provider from configuration.
    ///
    /// Explicit access keys are used when both are set; otherwise the
    /// default AWS credential chain applies.
    pub async fn new(config: &S3StorageConfig) -> AppResult<Self> {
        if config.bucket.is_empty() {
            return Err(AppError::configuration("storage.s3.bucket must be set"));
        }
        if config.access_key.is_empty() != config.secret_key.is_empty() {
            return Err(AppError::configuration(
                "storage.s3 requires both access_key and secret_key when either is set",
            ));
        }

        let region = aws_config::Region::new(config.region.clone());
        let mut builder = if config.access_key.is_empty() {
            let shared = aws_config::defaults(BehaviorVersion::latest())
                .region(region)
                .load()
                .await;
            aws_sdk_s3::config::Builder::from(&shared)
        } else {
            let credentials = aws_sdk_s3::config::Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "stowage-config",
            );
            aws_sdk_s3::config::Builder::new()
                .behavior_version(BehaviorVersion::latest())
                .region(region)
                .credentials_provider(credentials)
        };

        let endpoint = normalize_endpoint(&config.endpoint);
        if let Some(url) = &endpoint {
            builder = builder.endpoint_url(url);
        }
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            endpoint,
            region: config.region.clone(),
        })
    }

    /// Bucket this provider writes to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Prefix bare `host:port` endpoints with `http://`; empty means AWS.
fn normalize_endpoint(endpoint: &str) -> Option<String> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return None;
    }
    let lower = endpoint.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Some(endpoint.to_string())
    } else {
        Some(format!("http://{endpoint}"))
    }
}

fn map_sdk_error<E>(err: SdkError<E>, action: &str, key: &str) -> AppError
where
    E: std::error::Error + Send + Sync + 'static,
{
    AppError::with_source(
        ErrorKind::ExternalService,
        format!("S3 {action} failed for {key}"),
        err,
    )
}

fn is_not_found<E>(err: &SdkError<E>) -> bool {
    matches!(err, SdkError::ServiceError(service) if service.raw().status().as_u16() == 404)
}

#[async_trait]
impl StorageProvider for S3StorageProvider {
    fn provider_type(&self) -> &str {
        "s3"
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn health_check(&self) -> AppResult<bool> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!(bucket = %self.bucket, error = %e, "S3 health check failed");
                Ok(false)
            }
        }
    }

    #[instrument(skip(self, stream), fields(backend = "s3"))]
    async fn write_stream(&self, path: &str, mut stream: ByteStream) -> AppResult<u64> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| AppError::with_source(ErrorKind::Storage, "Stream read error", e))?;
            buffer.extend_from_slice(&chunk);
        }
        let total = buffer.len() as u64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(buffer.freeze().into())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, "put_object", path))?;

        debug!(path, bytes = total, "Wrote object to S3");
        Ok(total)
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn delete(&self, path: &str) -> AppResult<()> {
        match self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(map_sdk_error(e, "delete_object", path)),
        }
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn exists(&self, path: &str) -> AppResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(map_sdk_error(e, "head_object", path)),
        }
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn presign_upload(
        &self,
        path: &str,
        content_type: &str,
        ttl: Duration,
    ) -> AppResult<PresignedUpload> {
        let presigning = PresigningConfig::expires_in(ttl).map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid presign expiry", e)
        })?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| map_sdk_error(e, "presign put_object", path))?;

        let headers: BTreeMap<String, String> = request
            .headers()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
            .collect();

        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AppError::with_source(ErrorKind::Configuration, "Invalid upload TTL", e))?;

        Ok(PresignedUpload {
            url: request.uri().to_string(),
            method: request.method().to_string(),
            headers,
            expires_at: Utc::now() + ttl,
        })
    }
}

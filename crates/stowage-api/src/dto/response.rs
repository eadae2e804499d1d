//! Response DTOs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stowage_entity::file::{File, FileEvent, FileOperation};
use stowage_entity::lock::DistributedLock;
use stowage_entity::user::UserAccount;
use stowage_service::file::{EventOutcome, OperationOutcome, UploadUrl};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

impl MessageResponse {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok`.
    pub status: String,
    /// Server version.
    pub version: String,
}

/// Readiness response with per-dependency results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Database backend and reachability.
    pub database: DependencyStatus,
    /// Cache backend and reachability.
    pub cache: DependencyStatus,
    /// Storage backend and reachability.
    pub storage: DependencyStatus,
}

/// Reachability of one backing service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyStatus {
    /// Implementation in use.
    pub backend: String,
    /// Whether the health probe succeeded.
    pub healthy: bool,
}

/// Token pair plus the authenticated account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Access token expiration.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration.
    pub refresh_expires_at: DateTime<Utc>,
    /// Account info.
    pub user: UserResponse,
}

/// Account summary for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// Account ID.
    pub id: Uuid,
    /// Username.
    pub username: String,
    /// Email.
    pub email: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Role.
    pub role: String,
    /// Status.
    pub status: String,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Last login.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<UserAccount> for UserResponse {
    fn from(user: UserAccount) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            role: user.role.to_string(),
            status: user.status.to_string(),
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// File metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResponse {
    /// File ID.
    pub id: Uuid,
    /// Object key.
    pub file_path: String,
    /// Uploading account.
    pub owner_id: Uuid,
    /// MIME type.
    pub content_type: String,
    /// Stored size, once known.
    pub size_bytes: Option<i64>,
    /// Live references held by other services.
    pub reference_count: i32,
    /// `pending`, `active` or `deleted`.
    pub status: String,
    /// Optimistic concurrency version.
    pub version: i64,
    /// Last time a reference was added or removed.
    pub last_referenced_at: Option<DateTime<Utc>>,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Updated at.
    pub updated_at: DateTime<Utc>,
}

impl From<File> for FileResponse {
    fn from(file: File) -> Self {
        Self {
            id: file.id,
            file_path: file.file_path,
            owner_id: file.owner_id,
            content_type: file.content_type,
            size_bytes: file.size_bytes,
            reference_count: file.reference_count,
            status: file.status.to_string(),
            version: file.version,
            last_referenced_at: file.last_referenced_at,
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }
}

/// A pending file together with where and how to upload it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadUrlResponse {
    /// The pending file record.
    pub file: FileResponse,
    /// Pre-authorized URL.
    pub upload_url: String,
    /// HTTP method to use.
    pub method: String,
    /// Headers the client must send.
    pub headers: BTreeMap<String, String>,
    /// When the URL stops working.
    pub expires_at: DateTime<Utc>,
}

impl From<UploadUrl> for UploadUrlResponse {
    fn from(upload: UploadUrl) -> Self {
        Self {
            file: upload.file.into(),
            upload_url: upload.upload.url,
            method: upload.upload.method,
            headers: upload.upload.headers,
            expires_at: upload.upload.expires_at,
        }
    }
}

/// Outcome of a storage event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEventResponse {
    /// Reporter's idempotency key.
    pub event_id: String,
    /// Object key.
    pub file_path: String,
    /// Event type.
    pub event_type: String,
    /// Processing status.
    pub status: String,
    /// Whether this is the stored result of an earlier delivery.
    pub replayed: bool,
    /// What processing did.
    pub result: Option<serde_json::Value>,
}

impl From<EventOutcome> for StorageEventResponse {
    fn from(outcome: EventOutcome) -> Self {
        let FileEvent {
            event_id,
            file_path,
            event_type,
            status,
            result,
            ..
        } = outcome.record;
        Self {
            event_id,
            file_path,
            event_type: event_type.to_string(),
            status: status.to_string(),
            replayed: outcome.replayed,
            result,
        }
    }
}

/// Outcome of a reference operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOperationResponse {
    /// Caller's idempotency key.
    pub operation_id: String,
    /// Target file.
    pub file_id: Uuid,
    /// Operation type.
    pub operation_type: String,
    /// Processing status.
    pub status: String,
    /// Whether this is the stored result of an earlier request.
    pub replayed: bool,
    /// Reference count and version after the operation.
    pub result: Option<serde_json::Value>,
}

impl From<OperationOutcome> for FileOperationResponse {
    fn from(outcome: OperationOutcome) -> Self {
        let FileOperation {
            operation_id,
            file_id,
            operation_type,
            status,
            result,
            ..
        } = outcome.record;
        Self {
            operation_id,
            file_id,
            operation_type: operation_type.to_string(),
            status: status.to_string(),
            replayed: outcome.replayed,
            result,
        }
    }
}

/// An unexpired lock lease.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockResponse {
    /// Lock name.
    pub name: String,
    /// Owner token.
    pub owner: String,
    /// When the current lease began.
    pub acquired_at: DateTime<Utc>,
    /// When it lapses.
    pub expires_at: DateTime<Utc>,
    /// Seconds left, rounded down.
    pub remaining_seconds: i64,
}

impl From<DistributedLock> for LockResponse {
    fn from(lock: DistributedLock) -> Self {
        let remaining_seconds = lock.remaining(Utc::now()).num_seconds().max(0);
        Self {
            name: lock.name,
            owner: lock.owner,
            acquired_at: lock.acquired_at,
            expires_at: lock.expires_at,
            remaining_seconds,
        }
    }
}

//! Request DTOs with validation.
//!
//! String fields are trimmed and numeric fields accept numeric strings at
//! deserialization time, before the `validator` rules run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use stowage_core::types::coerce;
use stowage_entity::file::{FileEventType, FileOperationType};
use stowage_entity::user::{UserRole, UserStatus};

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username.
    #[serde(deserialize_with = "coerce::trim_string")]
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token refresh request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshRequest {
    /// Refresh token.
    #[serde(deserialize_with = "coerce::trim_string")]
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Create account request (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Username.
    #[serde(deserialize_with = "coerce::trim_string")]
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    /// Email.
    #[serde(default, deserialize_with = "coerce::trim_string_opt")]
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    /// Initial password; strength is checked by the password policy.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Display name.
    #[serde(default, deserialize_with = "coerce::trim_string_opt")]
    #[validate(length(max = 255))]
    pub display_name: Option<String>,
    /// Role, `member` when omitted.
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// Enable or disable an account.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateUserStatusRequest {
    /// New status.
    pub status: UserStatus,
}

/// Create admin group request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAdminGroupRequest {
    /// Unique group name.
    #[serde(deserialize_with = "coerce::trim_string")]
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Description.
    #[serde(default, deserialize_with = "coerce::trim_string_opt")]
    pub description: Option<String>,
    /// Permission strings; a JSON-encoded array string is accepted too.
    #[serde(default, deserialize_with = "coerce::parse_json")]
    pub permissions: Vec<String>,
}

/// Partial admin group update.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateAdminGroupRequest {
    /// New name.
    #[serde(default, deserialize_with = "coerce::trim_string_opt")]
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// New description.
    #[serde(default, deserialize_with = "coerce::trim_string_opt")]
    pub description: Option<String>,
    /// Replacement permission list.
    #[serde(default, deserialize_with = "coerce::parse_json")]
    pub permissions: Option<Vec<String>>,
}

/// Add a member to an admin group.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddGroupMemberRequest {
    /// Account to add.
    pub user_id: Uuid,
}

/// Ask for a pre-authorized upload URL.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UploadUrlRequest {
    /// Client-side file name; sanitized into the object key.
    #[serde(deserialize_with = "coerce::trim_string")]
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    /// MIME type the client will upload.
    #[serde(deserialize_with = "coerce::trim_string")]
    #[validate(length(min = 1, max = 255))]
    pub content_type: String,
    /// Declared size, checked against the upload limit.
    #[serde(default, deserialize_with = "coerce::parse_number_opt")]
    pub size_bytes: Option<u64>,
}

/// Add or remove a reference to a file.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FileOperationRequest {
    /// Idempotency key chosen by the caller.
    #[serde(deserialize_with = "coerce::trim_string")]
    #[validate(length(min = 1, max = 255))]
    pub operation_id: String,
    /// Target file.
    pub file_id: Uuid,
    /// `add_reference` or `remove_reference`.
    pub operation_type: FileOperationType,
}

/// Storage notification reported by the bucket or a relay.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StorageEventRequest {
    /// Idempotency key chosen by the reporter.
    #[serde(deserialize_with = "coerce::trim_string")]
    #[validate(length(min = 1, max = 255))]
    pub event_id: String,
    /// Object key the event refers to.
    #[serde(deserialize_with = "coerce::trim_string")]
    #[validate(length(min = 1, max = 1024))]
    pub file_path: String,
    /// What happened to the object.
    pub event_type: FileEventType,
    /// Extra fields such as `size_bytes`; a JSON-encoded string is accepted.
    #[serde(default, deserialize_with = "coerce::parse_json")]
    pub payload: Option<serde_json::Value>,
}

/// Query string of the local upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTokenQuery {
    /// Signed upload token.
    pub token: String,
}

//! Reference operation records.
//!
//! Other services tell Stowage when they start or stop referencing a file.
//! `operation_id` is the idempotency key, so a retried request never
//! double-counts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::processing::ProcessingStatus;

/// Kind of reference operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "file_operation_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FileOperationType {
    /// Increment the reference count.
    AddReference,
    /// Decrement the reference count.
    RemoveReference,
}

impl FileOperationType {
    /// Signed change applied to the reference count.
    pub fn delta(&self) -> i32 {
        match self {
            Self::AddReference => 1,
            Self::RemoveReference => -1,
        }
    }

    /// Return the type as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddReference => "add_reference",
            Self::RemoveReference => "remove_reference",
        }
    }
}

impl fmt::Display for FileOperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A processed (or in-flight) reference operation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileOperation {
    /// Row identifier.
    pub id: Uuid,
    /// Idempotency key supplied by the caller.
    pub operation_id: String,
    /// Target file.
    pub file_id: Uuid,
    /// Operation kind.
    pub operation_type: FileOperationType,
    /// Account that submitted the operation.
    pub requested_by: Option<Uuid>,
    /// Processing state.
    pub status: ProcessingStatus,
    /// Optimistic concurrency counter.
    pub version: i64,
    /// Outcome stored on completion.
    pub result: Option<serde_json::Value>,
    /// Error message stored on failure.
    pub error: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Completion time.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Data for claiming an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFileOperation {
    /// Idempotency key.
    pub operation_id: String,
    /// Target file.
    pub file_id: Uuid,
    /// Operation kind.
    pub operation_type: FileOperationType,
    /// Submitting account.
    pub requested_by: Option<Uuid>,
}

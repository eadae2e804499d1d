//! Storage event records.
//!
//! Events come from the storage backend (bucket notifications or the local
//! upload endpoint). `event_id` is the idempotency key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::processing::ProcessingStatus;

/// Kind of storage event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "file_event_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FileEventType {
    /// Object written for the first time.
    ObjectCreated,
    /// Object overwritten.
    ObjectUpdated,
    /// Object removed.
    ObjectDeleted,
}

impl FileEventType {
    /// Return the type as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ObjectCreated => "object_created",
            Self::ObjectUpdated => "object_updated",
            Self::ObjectDeleted => "object_deleted",
        }
    }
}

impl fmt::Display for FileEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A processed (or in-flight) storage event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileEvent {
    /// Row identifier.
    pub id: Uuid,
    /// Idempotency key supplied by the producer.
    pub event_id: String,
    /// Object key the event refers to.
    pub file_path: String,
    /// Event kind.
    pub event_type: FileEventType,
    /// Processing state.
    pub status: ProcessingStatus,
    /// Optimistic concurrency counter.
    pub version: i64,
    /// Producer payload (reported size and similar).
    pub payload: Option<serde_json::Value>,
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

/// Data for claiming an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFileEvent {
    /// Idempotency key.
    pub event_id: String,
    /// Object key.
    pub file_path: String,
    /// Event kind.
    pub event_type: FileEventType,
    /// Producer payload.
    pub payload: Option<serde_json::Value>,
}

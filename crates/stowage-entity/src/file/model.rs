//! File model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::FileStatus;

/// A stored object and its reference bookkeeping.
///
/// `version` increments on every mutation; writers pass the version they
/// read and the store applies the change only if it still matches.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// File identifier.
    pub id: Uuid,
    /// Object key within the storage provider. Unique.
    pub file_path: String,
    /// Owning account.
    pub owner_id: Uuid,
    /// Declared MIME type.
    pub content_type: String,
    /// Size in bytes, known once the object has been stored.
    pub size_bytes: Option<i64>,
    /// Number of external references. Never negative.
    pub reference_count: i32,
    /// Lifecycle status.
    pub status: FileStatus,
    /// Optimistic concurrency counter.
    pub version: i64,
    /// Last time the reference count changed.
    pub last_referenced_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// Whether anything still references this file.
    pub fn is_referenced(&self) -> bool {
        self.reference_count > 0
    }
}

/// Data for registering a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFile {
    /// Object key.
    pub file_path: String,
    /// Owning account.
    pub owner_id: Uuid,
    /// Declared MIME type.
    pub content_type: String,
    /// Declared size, if known.
    pub size_bytes: Option<i64>,
}

//! In-memory file store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::types::pagination::{PageRequest, PageResponse};
use stowage_entity::file::{File, FileStatus, NewFile};

use super::paginate;
use crate::traits::FileStore;

/// Files keyed by id.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    rows: RwLock<HashMap<Uuid, File>>,
}

impl MemoryFileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `change` to the file if its version matches, bumping the
    /// version and `updated_at`.
    async fn guarded(
        &self,
        id: Uuid,
        current_version: i64,
        change: impl FnOnce(&mut File) -> bool + Send,
    ) -> Option<File> {
        let mut rows = self.rows.write().await;
        let file = rows.get_mut(&id).filter(|f| f.version == current_version)?;
        let mut next = file.clone();
        if !change(&mut next) {
            return None;
        }
        next.version += 1;
        next.updated_at = Utc::now();
        *file = next.clone();
        Some(next)
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn create(&self, data: &NewFile) -> AppResult<File> {
        let mut rows = self.rows.write().await;
        if rows.values().any(|f| f.file_path == data.file_path) {
            return Err(
                AppError::conflict(format!("File path '{}' already exists", data.file_path))
                    .with_key("file.path_taken"),
            );
        }
        let now = Utc::now();
        let file = File {
            id: Uuid::new_v4(),
            file_path: data.file_path.clone(),
            owner_id: data.owner_id,
            content_type: data.content_type.clone(),
            size_bytes: data.size_bytes,
            reference_count: 0,
            status: FileStatus::Pending,
            version: 0,
            last_referenced_at: None,
            created_at: now,
            updated_at: now,
        };
        rows.insert(file.id, file.clone());
        Ok(file)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find_by_path(&self, file_path: &str) -> AppResult<Option<File>> {
        let rows = self.rows.read().await;
        Ok(rows.values().find(|f| f.file_path == file_path).cloned())
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<File>> {
        let rows = self.rows.read().await;
        let mut files: Vec<File> = rows
            .values()
            .filter(|f| f.owner_id == owner_id && f.status != FileStatus::Deleted)
            .cloned()
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(files, page))
    }

    async fn update_reference_count(
        &self,
        id: Uuid,
        delta: i32,
        current_version: i64,
    ) -> AppResult<Option<File>> {
        Ok(self
            .guarded(id, current_version, |file| {
                let Some(next) = file.reference_count.checked_add(delta) else {
                    return false;
                };
                if next < 0 {
                    return false;
                }
                file.reference_count = next;
                file.last_referenced_at = Some(Utc::now());
                true
            })
            .await)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: FileStatus,
        current_version: i64,
    ) -> AppResult<Option<File>> {
        Ok(self
            .guarded(id, current_version, |file| {
                file.status = status;
                true
            })
            .await)
    }

    async fn mark_stored(
        &self,
        id: Uuid,
        size_bytes: Option<i64>,
        current_version: i64,
    ) -> AppResult<Option<File>> {
        Ok(self
            .guarded(id, current_version, |file| {
                file.status = FileStatus::Active;
                if size_bytes.is_some() {
                    file.size_bytes = size_bytes;
                }
                true
            })
            .await)
    }

    async fn list_unreferenced(&self, cutoff: DateTime<Utc>, limit: u64) -> AppResult<Vec<File>> {
        let rows = self.rows.read().await;
        let mut files: Vec<File> = rows
            .values()
            .filter(|f| {
                f.reference_count == 0
                    && f.updated_at < cutoff
                    && (f.status == FileStatus::Pending
                        || (f.status == FileStatus::Active && f.last_referenced_at.is_some()))
            })
            .cloned()
            .collect();
        files.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        files.truncate(limit as usize);
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryFileStore, File) {
        let store = MemoryFileStore::new();
        let file = store
            .create(&NewFile {
                file_path: "owner/abc/report.pdf".into(),
                owner_id: Uuid::new_v4(),
                content_type: "application/pdf".into(),
                size_bytes: None,
            })
            .await
            .unwrap();
        (store, file)
    }

    #[tokio::test]
    async fn test_stale_version_is_a_noop() {
        let (store, file) = seeded().await;
        let updated = store
            .update_reference_count(file.id, 1, file.version)
            .await
            .unwrap()
            .expect("matching version applies");
        assert_eq!(updated.reference_count, 1);
        assert_eq!(updated.version, file.version + 1);
        assert!(updated.last_referenced_at.is_some());

        let stale = store
            .update_reference_count(file.id, 1, file.version)
            .await
            .unwrap();
        assert!(stale.is_none());
        let current = store.find_by_id(file.id).await.unwrap().unwrap();
        assert_eq!(current.reference_count, 1);
    }

    #[tokio::test]
    async fn test_count_never_goes_negative() {
        let (store, file) = seeded().await;
        let result = store
            .update_reference_count(file.id, -1, file.version)
            .await
            .unwrap();
        assert!(result.is_none());
        let current = store.find_by_id(file.id).await.unwrap().unwrap();
        assert_eq!(current.reference_count, 0);
        assert_eq!(current.version, file.version);
    }

    #[tokio::test]
    async fn test_duplicate_path_conflicts() {
        let (store, file) = seeded().await;
        let err = store
            .create(&NewFile {
                file_path: file.file_path.clone(),
                owner_id: Uuid::new_v4(),
                content_type: "text/plain".into(),
                size_bytes: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.message_key.as_deref(), Some("file.path_taken"));
    }

    #[tokio::test]
    async fn test_mark_stored_keeps_size_when_absent() {
        let (store, file) = seeded().await;
        let stored = store
            .mark_stored(file.id, Some(42), file.version)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, FileStatus::Active);
        let again = store
            .mark_stored(file.id, None, stored.version)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.size_bytes, Some(42));
    }
}

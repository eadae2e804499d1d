//! Reference counting with optimistic concurrency.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_database::traits::FileStore;
use stowage_entity::file::{File, FileStatus};

/// Pause between attempts after losing a version race.
const RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// Adjusts `File.reference_count` through version-guarded updates.
#[derive(Debug, Clone)]
pub struct ReferenceCounter {
    files: Arc<dyn FileStore>,
    max_attempts: u32,
}

impl ReferenceCounter {
    /// Creates a counter that tries at most `max_attempts` times per call.
    pub fn new(files: Arc<dyn FileStore>, max_attempts: u32) -> Self {
        Self {
            files,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Add `delta` to the file's reference count.
    ///
    /// Re-reads the file and retries when another writer bumped the version
    /// in between. Fails with a conflict once attempts run out.
    pub async fn adjust(&self, file_id: Uuid, delta: i32) -> AppResult<File> {
        for attempt in 1..=self.max_attempts {
            let file = self
                .files
                .find_by_id(file_id)
                .await?
                .ok_or_else(|| AppError::not_found("File not found").with_key("file.not_found"))?;

            if file.status == FileStatus::Deleted {
                return Err(AppError::unprocessable("File has been deleted")
                    .with_key("file.deleted"));
            }
            match file.reference_count.checked_add(delta) {
                Some(next) if next < 0 => {
                    return Err(AppError::unprocessable(
                        "Reference count cannot become negative",
                    )
                    .with_key("file.reference_underflow"));
                }
                Some(_) => {}
                None => {
                    return Err(AppError::unprocessable("Reference count limit reached")
                        .with_key("file.reference_overflow"));
                }
            }

            if let Some(updated) = self
                .files
                .update_reference_count(file_id, delta, file.version)
                .await?
            {
                debug!(
                    file_id = %file_id,
                    delta,
                    reference_count = updated.reference_count,
                    "Reference count adjusted"
                );
                return Ok(updated);
            }

            debug!(file_id = %file_id, attempt, "Reference count version conflict, retrying");
            tokio::time::sleep(RETRY_BACKOFF * attempt).await;
        }

        warn!(file_id = %file_id, attempts = self.max_attempts, "Reference count retries exhausted");
        Err(AppError::conflict("File was modified concurrently, retry the request")
            .with_key("file.version_conflict"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::error::ErrorKind;
    use stowage_database::Stores;
    use stowage_entity::file::NewFile;

    async fn seeded() -> (Arc<dyn FileStore>, File) {
        let files = Stores::memory().files;
        let file = files
            .create(&NewFile {
                file_path: "o/u/a.txt".into(),
                owner_id: Uuid::new_v4(),
                content_type: "text/plain".into(),
                size_bytes: None,
            })
            .await
            .unwrap();
        (files, file)
    }

    #[tokio::test]
    async fn test_add_and_remove() {
        let (files, file) = seeded().await;
        let counter = ReferenceCounter::new(files, 3);

        assert_eq!(counter.adjust(file.id, 1).await.unwrap().reference_count, 1);
        assert_eq!(counter.adjust(file.id, 1).await.unwrap().reference_count, 2);
        let after = counter.adjust(file.id, -1).await.unwrap();
        assert_eq!(after.reference_count, 1);
        assert_eq!(after.version, file.version + 3);
    }

    #[tokio::test]
    async fn test_underflow_rejected() {
        let (files, file) = seeded().await;
        let counter = ReferenceCounter::new(files.clone(), 3);

        let err = counter.adjust(file.id, -1).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unprocessable);
        assert_eq!(err.message_key.as_deref(), Some("file.reference_underflow"));
        let unchanged = files.find_by_id(file.id).await.unwrap().unwrap();
        assert_eq!(unchanged.reference_count, 0);
        assert_eq!(unchanged.version, file.version);
    }

    #[tokio::test]
    async fn test_overflow_rejected_without_retrying() {
        let (files, file) = seeded().await;
        let full = files
            .update_reference_count(file.id, i32::MAX, file.version)
            .await
            .unwrap()
            .unwrap();
        let counter = ReferenceCounter::new(files.clone(), 3);

        let err = counter.adjust(file.id, 1).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unprocessable);
        assert_eq!(err.message_key.as_deref(), Some("file.reference_overflow"));
        let unchanged = files.find_by_id(file.id).await.unwrap().unwrap();
        assert_eq!(unchanged.reference_count, i32::MAX);
        assert_eq!(unchanged.version, full.version);
    }

    #[tokio::test]
    async fn test_missing_and_deleted() {
        let (files, file) = seeded().await;
        let counter = ReferenceCounter::new(files.clone(), 3);

        let missing = counter.adjust(Uuid::new_v4(), 1).await.unwrap_err();
        assert_eq!(missing.kind, ErrorKind::NotFound);

        files
            .update_status(file.id, FileStatus::Deleted, file.version)
            .await
            .unwrap();
        let deleted = counter.adjust(file.id, 1).await.unwrap_err();
        assert_eq!(deleted.message_key.as_deref(), Some("file.deleted"));
    }

    #[tokio::test]
    async fn test_concurrent_adjustments_all_land() {
        let (files, file) = seeded().await;
        let counter = ReferenceCounter::new(files.clone(), 50);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let counter = counter.clone();
                tokio::spawn(async move { counter.adjust(file.id, 1).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = files.find_by_id(file.id).await.unwrap().unwrap();
        assert_eq!(stored.reference_count, 8);
        assert_eq!(stored.version, file.version + 8);
    }
}

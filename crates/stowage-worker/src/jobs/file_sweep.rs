//! Removal of files nothing references any more.
//!
//! Candidates are abandoned uploads (still `pending`) and active files whose
//! last reference was removed, once they have been idle for the grace
//! period. Each file is marked `deleted` under its version guard before the
//! object is removed, so a reference added in between wins.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use stowage_database::traits::FileStore;
use stowage_entity::file::FileStatus;
use stowage_storage::StorageManager;

use crate::executor::{JobExecutionError, JobHandler};

/// Files examined per run.
const BATCH_SIZE: u64 = 500;

/// Deletes unreferenced files older than the grace period.
#[derive(Debug, Clone)]
pub struct UnreferencedFileSweepJob {
    files: Arc<dyn FileStore>,
    storage: StorageManager,
    grace: Duration,
}

impl UnreferencedFileSweepJob {
    /// Job type name.
    pub const JOB_TYPE: &'static str = "unreferenced_file_sweep";

    /// Create a sweep that spares files touched within `grace_hours`.
    pub fn new(files: Arc<dyn FileStore>, storage: StorageManager, grace_hours: u64) -> Self {
        Self {
            files,
            storage,
            grace: Duration::hours(grace_hours as i64),
        }
    }
}

#[async_trait]
impl JobHandler for UnreferencedFileSweepJob {
    fn job_type(&self) -> &str {
        Self::JOB_TYPE
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        let cutoff = Utc::now() - self.grace;
        let candidates = self
            .files
            .list_unreferenced(cutoff, BATCH_SIZE)
            .await
            .map_err(|e| JobExecutionError::Transient(format!("File sweep query failed: {e}")))?;

        let provider = self.storage.provider();
        let mut removed = 0u64;
        let mut skipped = 0u64;
        for file in &candidates {
            let marked = self
                .files
                .update_status(file.id, FileStatus::Deleted, file.version)
                .await?;
            if marked.is_none() {
                debug!(file_id = %file.id, "File changed since listing, skipping");
                skipped += 1;
                continue;
            }
            if let Err(e) = provider.delete(&file.file_path).await {
                warn!(file_id = %file.id, file_path = %file.file_path, error = %e, "Failed to delete object");
            }
            removed += 1;
        }

        info!(examined = candidates.len(), removed, skipped, "Unreferenced file sweep finished");
        Ok(json!({
            "task": Self::JOB_TYPE,
            "files_removed": removed,
            "files_skipped": skipped,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_database::Stores;
    use stowage_entity::file::NewFile;
    use stowage_storage::UploadTokenSigner;
    use stowage_storage::providers::LocalStorageProvider;
    use uuid::Uuid;

    async fn storage(dir: &tempfile::TempDir) -> StorageManager {
        let signer = UploadTokenSigner::new("sweep-secret").unwrap();
        let provider = LocalStorageProvider::new(
            &dir.path().to_string_lossy(),
            "http://localhost:8080",
            signer.clone(),
        )
        .await
        .unwrap();
        StorageManager::from_provider(Arc::new(provider), Some(signer))
    }

    fn new_file(owner: Uuid, path: &str) -> NewFile {
        NewFile {
            file_path: path.to_string(),
            owner_id: owner,
            content_type: "text/plain".into(),
            size_bytes: None,
        }
    }

    #[tokio::test]
    async fn test_sweeps_pending_and_dereferenced_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = Stores::memory().files;
        let owner = Uuid::new_v4();

        let pending = files.create(&new_file(owner, "o/1/pending.txt")).await.unwrap();

        let released = files.create(&new_file(owner, "o/2/released.txt")).await.unwrap();
        let released = files
            .mark_stored(released.id, Some(1), released.version)
            .await
            .unwrap()
            .unwrap();
        let released = files
            .update_reference_count(released.id, 1, released.version)
            .await
            .unwrap()
            .unwrap();
        files
            .update_reference_count(released.id, -1, released.version)
            .await
            .unwrap()
            .unwrap();
        std::fs::create_dir_all(dir.path().join("o/2")).unwrap();
        std::fs::write(dir.path().join("o/2/released.txt"), b"x").unwrap();

        let held = files.create(&new_file(owner, "o/3/held.txt")).await.unwrap();
        let held = files
            .mark_stored(held.id, Some(1), held.version)
            .await
            .unwrap()
            .unwrap();
        files
            .update_reference_count(held.id, 1, held.version)
            .await
            .unwrap()
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let job = UnreferencedFileSweepJob::new(files.clone(), storage(&dir).await, 0);
        let summary = job.execute().await.unwrap();
        assert_eq!(summary["files_removed"], 2);
        assert!(!dir.path().join("o/2/released.txt").exists());

        for (id, expected) in [
            (pending.id, FileStatus::Deleted),
            (released.id, FileStatus::Deleted),
            (held.id, FileStatus::Active),
        ] {
            assert_eq!(files.find_by_id(id).await.unwrap().unwrap().status, expected);
        }
    }

    #[tokio::test]
    async fn test_grace_period_spares_recent_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = Stores::memory().files;
        files
            .create(&new_file(Uuid::new_v4(), "o/1/fresh.txt"))
            .await
            .unwrap();

        let job = UnreferencedFileSweepJob::new(files, storage(&dir).await, 24);
        let summary = job.execute().await.unwrap();
        assert_eq!(summary["files_removed"], 0);
    }
}

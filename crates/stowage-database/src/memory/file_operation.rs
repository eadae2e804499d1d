//! In-memory reference operation records.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use stowage_core::result::AppResult;
use stowage_entity::file::{FileOperation, NewFileOperation};
use stowage_entity::processing::ProcessingStatus;

use crate::traits::{Begin, FileOperationStore};

/// Operations keyed by `operation_id`.
#[derive(Debug, Default)]
pub struct MemoryFileOperationStore {
    rows: RwLock<HashMap<String, FileOperation>>,
}

impl MemoryFileOperationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn finish(
        &self,
        operation_id: &str,
        current_version: i64,
        apply: impl FnOnce(&mut FileOperation) + Send,
    ) -> Option<FileOperation> {
        let mut rows = self.rows.write().await;
        let operation = rows.get_mut(operation_id).filter(|o| {
            o.version == current_version && o.status == ProcessingStatus::Processing
        })?;
        apply(operation);
        operation.version += 1;
        operation.updated_at = Utc::now();
        Some(operation.clone())
    }
}

#[async_trait]
impl FileOperationStore for MemoryFileOperationStore {
    async fn begin(&self, data: &NewFileOperation) -> AppResult<Begin<FileOperation>> {
        let mut rows = self.rows.write().await;
        if let Some(existing) = rows.get_mut(&data.operation_id) {
            return Ok(match existing.status {
                ProcessingStatus::Completed => Begin::Completed(existing.clone()),
                ProcessingStatus::Processing => Begin::InProgress(existing.clone()),
                ProcessingStatus::Failed => {
                    existing.status = ProcessingStatus::Processing;
                    existing.error = None;
                    existing.version += 1;
                    existing.updated_at = Utc::now();
                    Begin::Restarted(existing.clone())
                }
            });
        }

        let now = Utc::now();
        let operation = FileOperation {
            id: Uuid::new_v4(),
            operation_id: data.operation_id.clone(),
            file_id: data.file_id,
            operation_type: data.operation_type,
            requested_by: data.requested_by,
            status: ProcessingStatus::Processing,
            version: 0,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        rows.insert(operation.operation_id.clone(), operation.clone());
        Ok(Begin::Started(operation))
    }

    async fn find_by_operation_id(
        &self,
        operation_id: &str,
    ) -> AppResult<Option<FileOperation>> {
        Ok(self.rows.read().await.get(operation_id).cloned())
    }

    async fn complete(
        &self,
        operation_id: &str,
        current_version: i64,
        result: serde_json::Value,
    ) -> AppResult<Option<FileOperation>> {
        Ok(self
            .finish(operation_id, current_version, |operation| {
                operation.status = ProcessingStatus::Completed;
                operation.result = Some(result);
                operation.completed_at = Some(Utc::now());
            })
            .await)
    }

    async fn fail(
        &self,
        operation_id: &str,
        current_version: i64,
        error: &str,
    ) -> AppResult<Option<FileOperation>> {
        let error = error.to_string();
        Ok(self
            .finish(operation_id, current_version, |operation| {
                operation.status = ProcessingStatus::Failed;
                operation.error = Some(error);
            })
            .await)
    }
}

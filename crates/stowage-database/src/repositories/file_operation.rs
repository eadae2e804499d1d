//! Reference operation repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_entity::file::{FileOperation, NewFileOperation};
use stowage_entity::processing::ProcessingStatus;

use crate::traits::{Begin, FileOperationStore};

/// Repository for idempotent reference operations.
#[derive(Debug, Clone)]
pub struct FileOperationRepository {
    pool: PgPool,
}

impl FileOperationRepository {
    /// Create a new file operation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn restart_failed(
        &self,
        operation_id: &str,
        version: i64,
    ) -> AppResult<Option<FileOperation>> {
        sqlx::query_as::<_, FileOperation>(
            "UPDATE file_operations SET \
                status = 'processing', error = NULL, version = version + 1, updated_at = NOW() \
             WHERE operation_id = $1 AND version = $2 AND status = 'failed' RETURNING *",
        )
        .bind(operation_id)
        .bind(version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to restart operation", e))
    }

    async fn existing(&self, operation_id: &str) -> AppResult<FileOperation> {
        self.find_by_operation_id(operation_id)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!(
                    "Operation '{operation_id}' disappeared while being claimed"
                ))
            })
    }
}

#[async_trait]
impl FileOperationStore for FileOperationRepository {
    async fn begin(&self, data: &NewFileOperation) -> AppResult<Begin<FileOperation>> {
        let inserted = sqlx::query_as::<_, FileOperation>(
            "INSERT INTO file_operations (id, operation_id, file_id, operation_type, requested_by) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (operation_id) DO NOTHING RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.operation_id)
        .bind(data.file_id)
        .bind(data.operation_type)
        .bind(data.requested_by)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim operation", e))?;

        if let Some(operation) = inserted {
            return Ok(Begin::Started(operation));
        }

        let existing = self.existing(&data.operation_id).await?;
        match existing.status {
            ProcessingStatus::Completed => Ok(Begin::Completed(existing)),
            ProcessingStatus::Processing => Ok(Begin::InProgress(existing)),
            ProcessingStatus::Failed => {
                match self
                    .restart_failed(&data.operation_id, existing.version)
                    .await?
                {
                    Some(operation) => Ok(Begin::Restarted(operation)),
                    None => {
                        let current = self.existing(&data.operation_id).await?;
                        Ok(match current.status {
                            ProcessingStatus::Completed => Begin::Completed(current),
                            _ => Begin::InProgress(current),
                        })
                    }
                }
            }
        }
    }

    async fn find_by_operation_id(
        &self,
        operation_id: &str,
    ) -> AppResult<Option<FileOperation>> {
        sqlx::query_as::<_, FileOperation>(
            "SELECT * FROM file_operations WHERE operation_id = $1",
        )
        .bind(operation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find operation", e))
    }

    async fn complete(
        &self,
        operation_id: &str,
        current_version: i64,
        result: serde_json::Value,
    ) -> AppResult<Option<FileOperation>> {
        sqlx::query_as::<_, FileOperation>(
            "UPDATE file_operations SET \
                status = 'completed', result = $3, version = version + 1, \
                updated_at = NOW(), completed_at = NOW() \
             WHERE operation_id = $1 AND version = $2 AND status = 'processing' RETURNING *",
        )
        .bind(operation_id)
        .bind(current_version)
        .bind(result)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete operation", e))
    }

    async fn fail(
        &self,
        operation_id: &str,
        current_version: i64,
        error: &str,
    ) -> AppResult<Option<FileOperation>> {
        sqlx::query_as::<_, FileOperation>(
            "UPDATE file_operations SET \
                status = 'failed', error = $3, version = version + 1, updated_at = NOW() \
             WHERE operation_id = $1 AND version = $2 AND status = 'processing' RETURNING *",
        )
        .bind(operation_id)
        .bind(current_version)
        .bind(error)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark operation failed", e)
        })
    }
}

//! Storage event repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_entity::file::{FileEvent, NewFileEvent};
use stowage_entity::processing::ProcessingStatus;

use crate::traits::{Begin, FileEventStore};

/// Repository for idempotent storage event records.
#[derive(Debug, Clone)]
pub struct FileEventRepository {
    pool: PgPool,
}

impl FileEventRepository {
    /// Create a new file event repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn restart_failed(&self, event_id: &str, version: i64) -> AppResult<Option<FileEvent>> {
        sqlx::query_as::<_, FileEvent>(
            "UPDATE file_events SET \
                status = 'processing', error = NULL, version = version + 1, updated_at = NOW() \
             WHERE event_id = $1 AND version = $2 AND status = 'failed' RETURNING *",
        )
        .bind(event_id)
        .bind(version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to restart event", e))
    }

    async fn existing(&self, event_id: &str) -> AppResult<FileEvent> {
        self.find_by_event_id(event_id).await?.ok_or_else(|| {
            AppError::internal(format!("Event '{event_id}' disappeared while being claimed"))
        })
    }
}

#[async_trait]
impl FileEventStore for FileEventRepository {
    async fn begin(&self, data: &NewFileEvent) -> AppResult<Begin<FileEvent>> {
        let inserted = sqlx::query_as::<_, FileEvent>(
            "INSERT INTO file_events (id, event_id, file_path, event_type, payload) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (event_id) DO NOTHING RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.event_id)
        .bind(&data.file_path)
        .bind(data.event_type)
        .bind(&data.payload)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim event", e))?;

        if let Some(event) = inserted {
            return Ok(Begin::Started(event));
        }

        let existing = self.existing(&data.event_id).await?;
        match existing.status {
            ProcessingStatus::Completed => Ok(Begin::Completed(existing)),
            ProcessingStatus::Processing => Ok(Begin::InProgress(existing)),
            ProcessingStatus::Failed => {
                match self.restart_failed(&data.event_id, existing.version).await? {
                    Some(event) => Ok(Begin::Restarted(event)),
                    None => {
                        let current = self.existing(&data.event_id).await?;
                        Ok(match current.status {
                            ProcessingStatus::Completed => Begin::Completed(current),
                            _ => Begin::InProgress(current),
                        })
                    }
                }
            }
        }
    }

    async fn find_by_event_id(&self, event_id: &str) -> AppResult<Option<FileEvent>> {
        sqlx::query_as::<_, FileEvent>("SELECT * FROM file_events WHERE event_id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find event", e))
    }

    async fn complete(
        &self,
        event_id: &str,
        current_version: i64,
        result: serde_json::Value,
    ) -> AppResult<Option<FileEvent>> {
        sqlx::query_as::<_, FileEvent>(
            "UPDATE file_events SET \
                status = 'completed', result = $3, version = version + 1, \
                updated_at = NOW(), completed_at = NOW() \
             WHERE event_id = $1 AND version = $2 AND status = 'processing' RETURNING *",
        )
        .bind(event_id)
        .bind(current_version)
        .bind(result)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete event", e))
    }

    async fn fail(
        &self,
        event_id: &str,
        current_version: i64,
        error: &str,
    ) -> AppResult<Option<FileEvent>> {
        sqlx::query_as::<_, FileEvent>(
            "UPDATE file_events SET \
                status = 'failed', error = $3, version = version + 1, updated_at = NOW() \
             WHERE event_id = $1 AND version = $2 AND status = 'processing' RETURNING *",
        )
        .bind(event_id)
        .bind(current_version)
        .bind(error)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark event failed", e))
    }
}

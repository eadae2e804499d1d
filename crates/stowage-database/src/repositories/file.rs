//! File repository implementation.
//!
//! Every mutation is a single conditional `UPDATE ... WHERE version = $n`
//! so concurrent writers cannot both succeed against the same version.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_core::types::pagination::{PageRequest, PageResponse};
use stowage_entity::file::{File, FileStatus, NewFile};

use crate::traits::FileStore;

/// Repository for file rows.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileStore for FileRepository {
    async fn create(&self, data: &NewFile) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "INSERT INTO files (id, file_path, owner_id, content_type, size_bytes) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.file_path)
        .bind(data.owner_id)
        .bind(&data.content_type)
        .bind(data.size_bytes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("files_file_path_key") =>
            {
                AppError::conflict(format!("File path '{}' already exists", data.file_path))
                    .with_key("file.path_taken")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create file", e),
        })
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    async fn find_by_path(&self, file_path: &str) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE file_path = $1")
            .bind(file_path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find file by path", e)
            })
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<File>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM files WHERE owner_id = $1 AND status <> 'deleted'",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count files", e))?;

        let files = sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE owner_id = $1 AND status <> 'deleted' \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(owner_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))?;

        Ok(PageResponse::new(
            files,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn update_reference_count(
        &self,
        id: Uuid,
        delta: i32,
        current_version: i64,
    ) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET \
                reference_count = reference_count + $2, \
                version = version + 1, \
                last_referenced_at = NOW(), \
                updated_at = NOW() \
             WHERE id = $1 AND version = $3 AND reference_count + $2 >= 0 \
             RETURNING *",
        )
        .bind(id)
        .bind(delta)
        .bind(current_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update reference count", e)
        })
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: FileStatus,
        current_version: i64,
    ) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET status = $2, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND version = $3 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(current_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update file status", e))
    }

    async fn mark_stored(
        &self,
        id: Uuid,
        size_bytes: Option<i64>,
        current_version: i64,
    ) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET \
                status = 'active', \
                size_bytes = COALESCE($2, size_bytes), \
                version = version + 1, \
                updated_at = NOW() \
             WHERE id = $1 AND version = $3 RETURNING *",
        )
        .bind(id)
        .bind(size_bytes)
        .bind(current_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark file as stored", e)
        })
    }

    async fn list_unreferenced(&self, cutoff: DateTime<Utc>, limit: u64) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files \
             WHERE reference_count = 0 AND updated_at < $1 \
               AND (status = 'pending' OR (status = 'active' AND last_referenced_at IS NOT NULL)) \
             ORDER BY updated_at ASC LIMIT $2",
        )
        .bind(cutoff)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list unreferenced files", e)
        })
    }
}

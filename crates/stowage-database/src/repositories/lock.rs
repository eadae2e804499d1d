//! Distributed lock repository implementation.
//!
//! Lease arithmetic uses the database clock so replicas with skewed clocks
//! agree on expiry.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_entity::lock::DistributedLock;

use crate::traits::LockStore;

/// Repository for lock leases.
#[derive(Debug, Clone)]
pub struct LockRepository {
    pool: PgPool,
}

impl LockRepository {
    /// Create a new lock repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LockStore for LockRepository {
    async fn try_acquire(
        &self,
        name: &str,
        owner: &str,
        ttl: Duration,
    ) -> AppResult<Option<DistributedLock>> {
        sqlx::query_as::<_, DistributedLock>(
            "INSERT INTO distributed_locks (name, owner, acquired_at, expires_at) \
             VALUES ($1, $2, NOW(), NOW() + make_interval(secs => $3)) \
             ON CONFLICT (name) DO UPDATE SET \
                owner = EXCLUDED.owner, \
                acquired_at = EXCLUDED.acquired_at, \
                expires_at = EXCLUDED.expires_at \
             WHERE distributed_locks.expires_at <= NOW() \
             RETURNING *",
        )
        .bind(name)
        .bind(owner)
        .bind(ttl.as_secs_f64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to acquire lock", e))
    }

    async fn renew(
        &self,
        name: &str,
        owner: &str,
        ttl: Duration,
    ) -> AppResult<Option<DistributedLock>> {
        sqlx::query_as::<_, DistributedLock>(
            "UPDATE distributed_locks SET expires_at = NOW() + make_interval(secs => $3) \
             WHERE name = $1 AND owner = $2 AND expires_at > NOW() RETURNING *",
        )
        .bind(name)
        .bind(owner)
        .bind(ttl.as_secs_f64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to renew lock", e))
    }

    async fn release(&self, name: &str, owner: &str) -> AppResult<bool> {
        sqlx::query("DELETE FROM distributed_locks WHERE name = $1 AND owner = $2")
            .bind(name)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected() == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to release lock", e))
    }

    async fn find_active(&self, name: &str) -> AppResult<Option<DistributedLock>> {
        sqlx::query_as::<_, DistributedLock>(
            "SELECT * FROM distributed_locks WHERE name = $1 AND expires_at > NOW()",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find lock", e))
    }

    async fn list_active(&self) -> AppResult<Vec<DistributedLock>> {
        sqlx::query_as::<_, DistributedLock>(
            "SELECT * FROM distributed_locks WHERE expires_at > NOW() ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list locks", e))
    }

    async fn purge_expired(&self) -> AppResult<u64> {
        sqlx::query("DELETE FROM distributed_locks WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to purge locks", e))
    }
}

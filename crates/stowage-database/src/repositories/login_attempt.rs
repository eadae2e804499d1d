//! Login attempt repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_entity::auth::{LoginAttempt, NewLoginAttempt};

use crate::traits::LoginAttemptStore;

/// Repository for login attempt history.
#[derive(Debug, Clone)]
pub struct LoginAttemptRepository {
    pool: PgPool,
}

impl LoginAttemptRepository {
    /// Create a new login attempt repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoginAttemptStore for LoginAttemptRepository {
    async fn record(&self, attempt: &NewLoginAttempt) -> AppResult<LoginAttempt> {
        sqlx::query_as::<_, LoginAttempt>(
            "INSERT INTO login_attempts (id, user_account_id, username, ip_address, successful) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(attempt.user_account_id)
        .bind(&attempt.username)
        .bind(&attempt.ip_address)
        .bind(attempt.successful)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record login attempt", e))
    }

    async fn count_recent_failures(
        &self,
        user_account_id: Uuid,
        ip_address: &str,
        since: DateTime<Utc>,
    ) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM login_attempts \
             WHERE user_account_id = $1 AND ip_address = $2 AND successful = FALSE \
               AND attempted_at > $3 \
               AND attempted_at > COALESCE( \
                   (SELECT MAX(attempted_at) FROM login_attempts \
                     WHERE user_account_id = $1 AND successful = TRUE), \
                   '-infinity'::timestamptz)",
        )
        .bind(user_account_id)
        .bind(ip_address)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count failed logins", e)
        })?;
        Ok(count as u64)
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        sqlx::query("DELETE FROM login_attempts WHERE attempted_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to purge login attempts", e)
            })
    }
}

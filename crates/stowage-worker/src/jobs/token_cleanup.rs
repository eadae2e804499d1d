//! Removal of expired refresh tokens and old login attempts.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tracing::info;

use stowage_database::traits::{LoginAttemptStore, RefreshTokenStore};

use crate::executor::{JobExecutionError, JobHandler};

/// Deletes refresh tokens past their expiry and login attempts older than
/// the retention window.
#[derive(Debug, Clone)]
pub struct TokenCleanupJob {
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    login_attempts: Arc<dyn LoginAttemptStore>,
    attempt_retention: Duration,
}

impl TokenCleanupJob {
    /// Job type name.
    pub const JOB_TYPE: &'static str = "token_cleanup";

    /// Create a new cleanup job keeping attempts for `retention_days`.
    pub fn new(
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        login_attempts: Arc<dyn LoginAttemptStore>,
        retention_days: u64,
    ) -> Self {
        Self {
            refresh_tokens,
            login_attempts,
            attempt_retention: Duration::days(retention_days as i64),
        }
    }
}

#[async_trait]
impl JobHandler for TokenCleanupJob {
    fn job_type(&self) -> &str {
        Self::JOB_TYPE
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        let now = Utc::now();
        let tokens = self
            .refresh_tokens
            .purge_expired(now)
            .await
            .map_err(|e| JobExecutionError::Transient(format!("Token purge failed: {e}")))?;
        let attempts = self
            .login_attempts
            .purge_before(now - self.attempt_retention)
            .await
            .map_err(|e| JobExecutionError::Transient(format!("Attempt purge failed: {e}")))?;

        info!(tokens, attempts, "Token cleanup finished");
        Ok(json!({
            "task": Self::JOB_TYPE,
            "expired_refresh_tokens_removed": tokens,
            "login_attempts_removed": attempts,
        }))
    }
}

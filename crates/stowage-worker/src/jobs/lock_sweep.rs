//! Purge of expired lock rows.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use stowage_service::LockService;

use crate::executor::{JobExecutionError, JobHandler};

/// Physically removes lease rows whose `expires_at` has passed.
#[derive(Debug, Clone)]
pub struct LockSweepJob {
    locks: LockService,
}

impl LockSweepJob {
    /// Job type name.
    pub const JOB_TYPE: &'static str = "lock_sweep";

    /// Create a new lock sweep job.
    pub fn new(locks: LockService) -> Self {
        Self { locks }
    }
}

#[async_trait]
impl JobHandler for LockSweepJob {
    fn job_type(&self) -> &str {
        Self::JOB_TYPE
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        let purged = self
            .locks
            .purge_expired()
            .await
            .map_err(|e| JobExecutionError::Transient(format!("Lock sweep failed: {e}")))?;
        if purged > 0 {
            info!(purged, "Purged expired locks");
        }
        Ok(json!({ "task": Self::JOB_TYPE, "expired_locks_removed": purged }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use stowage_core::config::LockConfig;
    use stowage_database::Stores;

    #[tokio::test]
    async fn test_purges_only_expired() {
        let stores = Stores::memory();
        let locks = LockService::new(stores.locks.clone(), &LockConfig::default());
        locks
            .acquire("stale", Some(Duration::from_millis(10)))
            .await
            .unwrap()
            .unwrap();
        locks.acquire("live", None).await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let summary = LockSweepJob::new(locks.clone()).execute().await.unwrap();
        assert_eq!(summary["expired_locks_removed"], 1);
        let active = locks.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "live");
    }
}

//! Job executor: dispatches jobs to registered handlers under a lease.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use stowage_core::error::AppError;
use stowage_service::LockService;

/// Prefix of the lock name each job runs under.
const LEASE_PREFIX: &str = "worker:";

/// Trait for job handler implementations.
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// The job type this handler processes.
    fn job_type(&self) -> &str;

    /// Run the job once, returning a summary of what was done.
    async fn execute(&self) -> Result<Value, JobExecutionError>;
}

/// Error from job execution.
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// No handler is registered for the requested type.
    #[error("Unknown job type: {0}")]
    UnknownJob(String),

    /// The job failed; the next scheduled run tries again.
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

/// Dispatches jobs by type, each under its own distributed lease.
#[derive(Debug)]
pub struct JobExecutor {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
    locks: LockService,
    lease: Duration,
}

impl JobExecutor {
    /// Create an executor whose jobs hold their lease for `lease`.
    pub fn new(locks: LockService, lease: Duration) -> Self {
        Self {
            handlers: HashMap::new(),
            locks,
            lease,
        }
    }

    /// Register a job handler.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let job_type = handler.job_type().to_string();
        info!(job_type = %job_type, "Registered job handler");
        self.handlers.insert(job_type, handler);
    }

    /// Run a job if no other replica is running it.
    ///
    /// Returns `Ok(None)` when the lease is held elsewhere.
    pub async fn execute(&self, job_type: &str) -> Result<Option<Value>, JobExecutionError> {
        let handler = self
            .handlers
            .get(job_type)
            .ok_or_else(|| JobExecutionError::UnknownJob(job_type.to_string()))?;

        let lease_name = format!("{LEASE_PREFIX}{job_type}");
        let started = Instant::now();
        let outcome = self
            .locks
            .with_lock(&lease_name, Some(self.lease), async {
                Ok(handler.execute().await)
            })
            .await?;

        match outcome {
            None => {
                debug!(job_type = %job_type, "Job skipped, lease held by another worker");
                Ok(None)
            }
            Some(Ok(summary)) => {
                info!(
                    job_type = %job_type,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    summary = %summary,
                    "Job completed"
                );
                Ok(Some(summary))
            }
            Some(Err(e)) => {
                warn!(job_type = %job_type, error = %e, "Job failed");
                Err(e)
            }
        }
    }

    /// Check if a handler is registered for a job type.
    pub fn has_handler(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    /// Registered job types, sorted.
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use stowage_core::config::LockConfig;
    use stowage_database::Stores;

    #[derive(Debug, Default)]
    struct CountingJob {
        runs: AtomicU32,
    }

    #[async_trait]
    impl JobHandler for CountingJob {
        fn job_type(&self) -> &str {
            "counting"
        }

        async fn execute(&self) -> Result<Value, JobExecutionError> {
            let runs = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(serde_json::json!({ "runs": runs }))
        }
    }

    fn executor() -> (JobExecutor, LockService, Arc<CountingJob>) {
        let locks = LockService::new(Stores::memory().locks, &LockConfig::default());
        let mut executor = JobExecutor::new(locks.clone(), Duration::from_secs(60));
        let job = Arc::new(CountingJob::default());
        executor.register(job.clone());
        (executor, locks, job)
    }

    #[tokio::test]
    async fn test_runs_and_releases_lease() {
        let (executor, locks, job) = executor();
        let summary = executor.execute("counting").await.unwrap().unwrap();
        assert_eq!(summary["runs"], 1);
        assert_eq!(job.runs.load(Ordering::SeqCst), 1);
        assert!(locks.list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_skips_when_lease_held() {
        let (executor, locks, job) = executor();
        let _held = locks.acquire("worker:counting", None).await.unwrap().unwrap();

        assert!(executor.execute("counting").await.unwrap().is_none());
        assert_eq!(job.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let (executor, _, _) = executor();
        assert!(matches!(
            executor.execute("missing").await,
            Err(JobExecutionError::UnknownJob(_))
        ));
        assert_eq!(executor.registered_types(), vec!["counting".to_string()]);
    }
}

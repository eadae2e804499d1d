//! Worker assembly: registers the built-in jobs and schedules them.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::info;

use stowage_core::config::WorkerConfig;
use stowage_core::error::AppError;
use stowage_database::Stores;
use stowage_service::LockService;
use stowage_storage::StorageManager;

use crate::executor::{JobExecutionError, JobExecutor};
use crate::jobs::{LockSweepJob, TokenCleanupJob, UnreferencedFileSweepJob};
use crate::scheduler::CronScheduler;

/// Owns the executor and, once started, the cron scheduler.
#[derive(Debug)]
pub struct WorkerRunner {
    config: WorkerConfig,
    executor: Arc<JobExecutor>,
    scheduler: Option<CronScheduler>,
}

impl WorkerRunner {
    /// Build the executor with every built-in job registered.
    pub fn new(
        config: WorkerConfig,
        stores: &Stores,
        locks: LockService,
        storage: StorageManager,
    ) -> Self {
        let mut executor = JobExecutor::new(
            locks.clone(),
            Duration::from_secs(config.job_lease_seconds.max(1)),
        );
        executor.register(Arc::new(LockSweepJob::new(locks)));
        executor.register(Arc::new(TokenCleanupJob::new(
            Arc::clone(&stores.refresh_tokens),
            Arc::clone(&stores.login_attempts),
            config.login_attempt_retention_days,
        )));
        executor.register(Arc::new(UnreferencedFileSweepJob::new(
            Arc::clone(&stores.files),
            storage,
            config.unreferenced_file_grace_hours,
        )));

        Self {
            config,
            executor: Arc::new(executor),
            scheduler: None,
        }
    }

    /// Schedule every job and start ticking. No-op when the worker is
    /// disabled.
    pub async fn start(&mut self) -> Result<(), AppError> {
        if !self.config.enabled {
            info!("Background worker disabled");
            return Ok(());
        }

        let scheduler = CronScheduler::new(Arc::clone(&self.executor)).await?;
        scheduler
            .schedule(LockSweepJob::JOB_TYPE, &self.config.lock_sweep_cron)
            .await?;
        scheduler
            .schedule(TokenCleanupJob::JOB_TYPE, &self.config.token_cleanup_cron)
            .await?;
        scheduler
            .schedule(UnreferencedFileSweepJob::JOB_TYPE, &self.config.file_sweep_cron)
            .await?;
        scheduler.start().await?;

        self.scheduler = Some(scheduler);
        Ok(())
    }

    /// Run one job immediately, under its lease.
    pub async fn run_now(&self, job_type: &str) -> Result<Option<Value>, JobExecutionError> {
        self.executor.execute(job_type).await
    }

    /// Registered job types.
    pub fn job_types(&self) -> Vec<String> {
        self.executor.registered_types()
    }

    /// Stop the scheduler if it is running.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.shutdown().await?;
        }
        Ok(())
    }
}

//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Maintenance job scheduling.
///
/// Cron expressions use the six-field form accepted by
/// `tokio-cron-scheduler` (seconds first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Schedule for purging expired lock rows.
    #[serde(default = "default_lock_sweep_cron")]
    pub lock_sweep_cron: String,
    /// Schedule for purging expired refresh tokens and old login attempts.
    #[serde(default = "default_token_cleanup_cron")]
    pub token_cleanup_cron: String,
    /// Schedule for removing unreferenced files.
    #[serde(default = "default_file_sweep_cron")]
    pub file_sweep_cron: String,
    /// Login attempts older than this are deleted.
    #[serde(default = "default_login_attempt_retention")]
    pub login_attempt_retention_days: u64,
    /// Unreferenced files younger than this are kept.
    #[serde(default = "default_unreferenced_grace")]
    pub unreferenced_file_grace_hours: u64,
    /// Lease held by a replica while it runs a job.
    #[serde(default = "default_job_lease")]
    pub job_lease_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lock_sweep_cron: default_lock_sweep_cron(),
            token_cleanup_cron: default_token_cleanup_cron(),
            file_sweep_cron: default_file_sweep_cron(),
            login_attempt_retention_days: default_login_attempt_retention(),
            unreferenced_file_grace_hours: default_unreferenced_grace(),
            job_lease_seconds: default_job_lease(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_lock_sweep_cron() -> String {
    "0 * * * * *".to_string()
}

fn default_token_cleanup_cron() -> String {
    "0 0 * * * *".to_string()
}

fn default_file_sweep_cron() -> String {
    "0 30 3 * * *".to_string()
}

fn default_login_attempt_retention() -> u64 {
    30
}

fn default_unreferenced_grace() -> u64 {
    24
}

fn default_job_lease() -> u64 {
    300
}

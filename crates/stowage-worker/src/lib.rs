//! Scheduled maintenance for Stowage.
//!
//! This crate provides:
//! - A job executor that runs each job under a `worker:{job}` lease, so
//!   only one replica executes a job per tick
//! - A cron scheduler that triggers jobs on their configured schedules
//! - Built-in jobs: expired lock purge, token and login-attempt cleanup,
//!   and removal of unreferenced files

pub mod executor;
pub mod jobs;
pub mod runner;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use runner::WorkerRunner;
pub use scheduler::CronScheduler;

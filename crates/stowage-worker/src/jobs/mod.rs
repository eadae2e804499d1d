//! Built-in maintenance jobs.

pub mod file_sweep;
pub mod lock_sweep;
pub mod token_cleanup;

pub use file_sweep::UnreferencedFileSweepJob;
pub use lock_sweep::LockSweepJob;
pub use token_cleanup::TokenCleanupJob;

//! Named leases over the lock store.

pub mod service;

pub use service::{LockLease, LockService};

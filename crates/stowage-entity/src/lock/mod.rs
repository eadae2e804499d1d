//! Distributed lock entities.

pub mod model;

pub use model::DistributedLock;

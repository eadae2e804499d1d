//! Core type definitions used across the Stowage workspace.

pub mod coerce;
pub mod pagination;

pub use pagination::{PageRequest, PageResponse};

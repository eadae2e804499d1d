//! # stowage-core
//!
//! Core crate for Stowage. Contains configuration schemas, the unified
//! error system, pagination and value-coercion types, and the traits that
//! the cache and storage crates implement.
//!
//! This crate has **no** internal dependencies on other Stowage crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;

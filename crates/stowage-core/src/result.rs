//! Convenience result type alias for Stowage.

use crate::error::AppError;

/// A specialized `Result` type for Stowage operations.
pub type AppResult<T> = Result<T, AppError>;

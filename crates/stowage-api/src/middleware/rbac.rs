//! Role guards used at the top of handlers.

use stowage_core::error::AppError;

use crate::extractors::AuthUser;

/// Checks that the authenticated account has the Admin role.
pub fn require_admin(auth: &AuthUser) -> Result<(), AppError> {
    auth.context().require_admin()
}

/// Checks that the authenticated account may report storage events and
/// reference operations (Service or Admin).
pub fn require_storage_reporter(auth: &AuthUser) -> Result<(), AppError> {
    auth.context().require_storage_reporter()
}

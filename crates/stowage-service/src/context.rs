//! Request context carrying the authenticated account and client details.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_entity::user::UserRole;

/// Context for the current authenticated request.
///
/// Extracted by the API layer and passed into service methods so that
/// every operation knows *who* is acting and from *which* login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated account ID.
    pub user_id: Uuid,
    /// Refresh family of the access token.
    pub family_id: Uuid,
    /// The account's role at the time the token was issued.
    pub role: UserRole,
    /// The username (convenience field from JWT claims).
    pub username: String,
    /// IP address of the request origin.
    pub ip_address: String,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(
        user_id: Uuid,
        family_id: Uuid,
        role: UserRole,
        username: String,
        ip_address: String,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            user_id,
            family_id,
            role,
            username,
            ip_address,
            user_agent,
            request_time: Utc::now(),
        }
    }

    /// Returns whether the current account is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Fails unless the current account is an admin.
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::authorization("Administrator role required")
                .with_key("auth.admin_required"))
        }
    }

    /// Fails unless the account may report storage events and reference
    /// operations.
    pub fn require_storage_reporter(&self) -> AppResult<()> {
        if self.role.can_report_storage() {
            Ok(())
        } else {
            Err(AppError::authorization("Service or administrator role required")
                .with_key("auth.service_required"))
        }
    }

    /// Whether the account may act on a resource owned by `owner_id`.
    pub fn can_access_owned(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id || self.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: UserRole) -> RequestContext {
        RequestContext::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            role,
            "u".to_string(),
            "127.0.0.1".to_string(),
            None,
        )
    }

    #[test]
    fn test_role_guards() {
        assert!(ctx(UserRole::Admin).require_admin().is_ok());
        assert!(ctx(UserRole::Member).require_admin().is_err());
        assert!(ctx(UserRole::Service).require_storage_reporter().is_ok());
        assert!(ctx(UserRole::Member).require_storage_reporter().is_err());
    }

    #[test]
    fn test_owned_access() {
        let member = ctx(UserRole::Member);
        assert!(member.can_access_owned(member.user_id));
        assert!(!member.can_access_owned(Uuid::new_v4()));
        assert!(ctx(UserRole::Admin).can_access_owned(Uuid::new_v4()));
    }
}

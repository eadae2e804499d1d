//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account roles.
///
/// `Service` is used by machine clients (storage notifications, other
/// backends) that report file events and reference changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full administrator.
    Admin,
    /// Regular user; owns files.
    Member,
    /// Machine client.
    Service,
}

impl UserRole {
    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Whether the role may post storage events and reference operations.
    pub fn can_report_storage(&self) -> bool {
        matches!(self, Self::Admin | Self::Service)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Service => "service",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = stowage_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            "service" => Ok(Self::Service),
            _ => Err(stowage_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: admin, member, service"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("SERVICE".parse::<UserRole>().unwrap(), UserRole::Service);
        assert!("viewer".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_storage_reporting() {
        assert!(UserRole::Service.can_report_storage());
        assert!(UserRole::Admin.can_report_storage());
        assert!(!UserRole::Member.can_report_storage());
    }
}

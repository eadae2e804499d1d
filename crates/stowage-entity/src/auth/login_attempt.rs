//! Login attempt records used for lockout decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One recorded login attempt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoginAttempt {
    /// Row identifier.
    pub id: Uuid,
    /// Account the attempt targeted, when the username resolved.
    pub user_account_id: Option<Uuid>,
    /// Username as submitted.
    pub username: String,
    /// Client address.
    pub ip_address: String,
    /// Whether the credentials were accepted.
    pub successful: bool,
    /// When the attempt happened.
    pub attempted_at: DateTime<Utc>,
}

/// Data for recording an attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLoginAttempt {
    /// Account the attempt targeted.
    pub user_account_id: Option<Uuid>,
    /// Username as submitted.
    pub username: String,
    /// Client address.
    pub ip_address: String,
    /// Whether the credentials were accepted.
    pub successful: bool,
}

//! Group membership rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Membership of an account in an admin group.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminGroupMember {
    /// Group.
    pub group_id: Uuid,
    /// Member account.
    pub user_account_id: Uuid,
    /// When the membership was created.
    pub added_at: DateTime<Utc>,
}

//! Administrative group model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named group of accounts sharing a permission list.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminGroup {
    /// Group identifier.
    pub id: Uuid,
    /// Unique group name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Permission identifiers granted to members.
    pub permissions: Vec<String>,
    /// Admin who created the group.
    pub created_by: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAdminGroup {
    /// Unique group name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Permission identifiers.
    pub permissions: Vec<String>,
    /// Creating admin.
    pub created_by: Option<Uuid>,
}

/// Partial update of a group. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAdminGroup {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement permission list.
    pub permissions: Option<Vec<String>>,
}

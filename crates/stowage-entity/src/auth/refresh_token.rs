//! Refresh token rows.
//!
//! Every login starts a token *family*. Rotating a refresh token revokes
//! the presented row and inserts its replacement in the same family, so a
//! replayed token can be traced to the family and the whole chain revoked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored refresh token.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    /// Token identifier; equal to the JWT `jti`.
    pub id: Uuid,
    /// Owning account.
    pub user_account_id: Uuid,
    /// Login family this token belongs to.
    pub family_id: Uuid,
    /// SHA-256 hex digest of the encoded token.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
    /// Set when rotated or revoked.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Token that replaced this one on rotation.
    pub replaced_by: Option<Uuid>,
    /// Client address at issue time.
    pub ip_address: Option<String>,
    /// Client user agent at issue time.
    pub user_agent: Option<String>,
    /// Issue time.
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Whether the token has been rotated or revoked.
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Whether the token has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Data for inserting a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRefreshToken {
    /// Token identifier (the JWT `jti`).
    pub id: Uuid,
    /// Owning account.
    pub user_account_id: Uuid,
    /// Login family.
    pub family_id: Uuid,
    /// SHA-256 hex digest of the encoded token.
    pub token_hash: String,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
    /// Client address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
}

//! Distributed lock lease rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named lease held by one owner until `expires_at`.
///
/// Expired rows are equivalent to absent rows; they are physically removed
/// by the lock sweep job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DistributedLock {
    /// Lock name. Unique.
    pub name: String,
    /// Opaque lease token of the current holder.
    pub owner: String,
    /// When the current holder acquired the lease.
    pub acquired_at: DateTime<Utc>,
    /// When the lease lapses.
    pub expires_at: DateTime<Utc>,
}

impl DistributedLock {
    /// Whether the lease has lapsed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Remaining lease time at `now`, zero if lapsed.
    pub fn remaining(&self, now: DateTime<Utc>) -> chrono::Duration {
        (self.expires_at - now).max(chrono::Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let lock = DistributedLock {
            name: "job".into(),
            owner: "a".into(),
            acquired_at: now - chrono::Duration::seconds(30),
            expires_at: now,
        };
        assert!(lock.is_expired(now));
        assert!(!lock.is_expired(now - chrono::Duration::seconds(1)));
        assert_eq!(lock.remaining(now + chrono::Duration::seconds(5)), chrono::Duration::zero());
    }
}

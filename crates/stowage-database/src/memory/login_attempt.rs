//! In-memory login attempt history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use stowage_core::result::AppResult;
use stowage_entity::auth::{LoginAttempt, NewLoginAttempt};

use crate::traits::LoginAttemptStore;

/// Attempts in insertion order.
#[derive(Debug, Default)]
pub struct MemoryLoginAttemptStore {
    rows: RwLock<Vec<LoginAttempt>>,
}

impl MemoryLoginAttemptStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoginAttemptStore for MemoryLoginAttemptStore {
    async fn record(&self, attempt: &NewLoginAttempt) -> AppResult<LoginAttempt> {
        let row = LoginAttempt {
            id: Uuid::new_v4(),
            user_account_id: attempt.user_account_id,
            username: attempt.username.clone(),
            ip_address: attempt.ip_address.clone(),
            successful: attempt.successful,
            attempted_at: Utc::now(),
        };
        self.rows.write().await.push(row.clone());
        Ok(row)
    }

    async fn count_recent_failures(
        &self,
        user_account_id: Uuid,
        ip_address: &str,
        since: DateTime<Utc>,
    ) -> AppResult<u64> {
        let rows = self.rows.read().await;
        let last_success = rows
            .iter()
            .filter(|a| a.user_account_id == Some(user_account_id) && a.successful)
            .map(|a| a.attempted_at)
            .max();

        let count = rows
            .iter()
            .filter(|a| {
                a.user_account_id == Some(user_account_id)
                    && !a.successful
                    && a.ip_address == ip_address
                    && a.attempted_at > since
                    && last_success.is_none_or(|s| a.attempted_at > s)
            })
            .count();
        Ok(count as u64)
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|a| a.attempted_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(user: Uuid, ip: &str, successful: bool) -> NewLoginAttempt {
        NewLoginAttempt {
            user_account_id: Some(user),
            username: "alice".into(),
            ip_address: ip.into(),
            successful,
        }
    }

    #[tokio::test]
    async fn test_failures_counted_per_ip_and_reset_by_success() {
        let store = MemoryLoginAttemptStore::new();
        let user = Uuid::new_v4();
        let since = Utc::now() - chrono::Duration::minutes(15);

        store.record(&attempt(user, "10.0.0.1", false)).await.unwrap();
        store.record(&attempt(user, "10.0.0.1", false)).await.unwrap();
        store.record(&attempt(user, "10.0.0.2", false)).await.unwrap();
        assert_eq!(store.count_recent_failures(user, "10.0.0.1", since).await.unwrap(), 2);
        assert_eq!(store.count_recent_failures(user, "10.0.0.2", since).await.unwrap(), 1);

        store.record(&attempt(user, "10.0.0.9", true)).await.unwrap();
        assert_eq!(store.count_recent_failures(user, "10.0.0.1", since).await.unwrap(), 0);

        store.record(&attempt(user, "10.0.0.1", false)).await.unwrap();
        assert_eq!(store.count_recent_failures(user, "10.0.0.1", since).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_window_excludes_old_failures() {
        let store = MemoryLoginAttemptStore::new();
        let user = Uuid::new_v4();
        store.record(&attempt(user, "ip", false)).await.unwrap();
        let future = Utc::now() + chrono::Duration::seconds(1);
        assert_eq!(store.count_recent_failures(user, "ip", future).await.unwrap(), 0);
        assert_eq!(store.purge_before(future).await.unwrap(), 1);
    }
}

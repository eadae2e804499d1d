//! In-memory lock leases.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_entity::lock::DistributedLock;

use crate::traits::LockStore;

/// Leases keyed by name.
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    rows: RwLock<HashMap<String, DistributedLock>>,
}

impl MemoryLockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lease(ttl: Duration) -> AppResult<chrono::Duration> {
    chrono::Duration::from_std(ttl)
        .map_err(|_| AppError::validation(format!("Lock TTL {ttl:?} is out of range")))
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn try_acquire(
        &self,
        name: &str,
        owner: &str,
        ttl: Duration,
    ) -> AppResult<Option<DistributedLock>> {
        let ttl = lease(ttl)?;
        let now = Utc::now();
        let mut rows = self.rows.write().await;
        if rows.get(name).is_some_and(|l| !l.is_expired(now)) {
            return Ok(None);
        }
        let lock = DistributedLock {
            name: name.to_string(),
            owner: owner.to_string(),
            acquired_at: now,
            expires_at: now + ttl,
        };
        rows.insert(lock.name.clone(), lock.clone());
        Ok(Some(lock))
    }

    async fn renew(
        &self,
        name: &str,
        owner: &str,
        ttl: Duration,
    ) -> AppResult<Option<DistributedLock>> {
        let ttl = lease(ttl)?;
        let now = Utc::now();
        let mut rows = self.rows.write().await;
        Ok(rows
            .get_mut(name)
            .filter(|l| l.owner == owner && !l.is_expired(now))
            .map(|l| {
                l.expires_at = now + ttl;
                l.clone()
            }))
    }

    async fn release(&self, name: &str, owner: &str) -> AppResult<bool> {
        let mut rows = self.rows.write().await;
        if rows.get(name).is_some_and(|l| l.owner == owner) {
            rows.remove(name);
            return Ok(true);
        }
        Ok(false)
    }

    async fn find_active(&self, name: &str) -> AppResult<Option<DistributedLock>> {
        let now = Utc::now();
        Ok(self
            .rows
            .read()
            .await
            .get(name)
            .filter(|l| !l.is_expired(now))
            .cloned())
    }

    async fn list_active(&self) -> AppResult<Vec<DistributedLock>> {
        let now = Utc::now();
        let rows = self.rows.read().await;
        let mut locks: Vec<DistributedLock> =
            rows.values().filter(|l| !l.is_expired(now)).cloned().collect();
        locks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locks)
    }

    async fn purge_expired(&self) -> AppResult<u64> {
        let now = Utc::now();
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, l| !l.is_expired(now));
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_held_lock_blocks_other_owner() {
        let store = MemoryLockStore::new();
        let ttl = Duration::from_secs(30);
        assert!(store.try_acquire("reindex", "a", ttl).await.unwrap().is_some());
        assert!(store.try_acquire("reindex", "b", ttl).await.unwrap().is_none());
        assert!(!store.release("reindex", "b").await.unwrap());
        assert!(store.find_active("reindex").await.unwrap().is_some());
        assert!(store.release("reindex", "a").await.unwrap());
        assert!(store.try_acquire("reindex", "b", ttl).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_lock_can_be_taken_over() {
        let store = MemoryLockStore::new();
        store
            .try_acquire("sweep", "a", Duration::from_millis(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(store.list_active().await.unwrap().is_empty());
        assert!(store.renew("sweep", "a", Duration::from_secs(5)).await.unwrap().is_none());
        let taken = store
            .try_acquire("sweep", "b", Duration::from_secs(5))
            .await
            .unwrap()
            .expect("expired lease is free");
        assert_eq!(taken.owner, "b");
    }

    #[tokio::test]
    async fn test_purge_removes_only_expired() {
        let store = MemoryLockStore::new();
        store.try_acquire("old", "a", Duration::from_millis(1)).await.unwrap();
        store.try_acquire("live", "a", Duration::from_secs(60)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(store.purge_expired().await.unwrap(), 1);
        let active = store.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "live");
    }
}

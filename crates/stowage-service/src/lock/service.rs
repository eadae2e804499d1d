//! Distributed locks backed by expiring lease rows.
//!
//! Each acquisition gets a fresh random owner token, so only the holder of
//! a [`LockLease`] can renew or release it. Leases are not reentrant.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use stowage_core::config::LockConfig;
use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_database::traits::LockStore;
use stowage_entity::lock::DistributedLock;

/// Proof of holding a named lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockLease {
    /// Lock name.
    pub name: String,
    /// Owner token written to the lease row.
    pub owner: String,
    /// When the lease lapses unless renewed.
    pub expires_at: DateTime<Utc>,
}

impl From<DistributedLock> for LockLease {
    fn from(lock: DistributedLock) -> Self {
        Self {
            name: lock.name,
            owner: lock.owner,
            expires_at: lock.expires_at,
        }
    }
}

/// Acquires, renews and releases named leases.
#[derive(Debug, Clone)]
pub struct LockService {
    locks: Arc<dyn LockStore>,
    default_ttl: Duration,
    max_ttl: Duration,
}

impl LockService {
    /// Creates a new lock service.
    pub fn new(locks: Arc<dyn LockStore>, config: &LockConfig) -> Self {
        let max_ttl = Duration::from_secs(config.max_ttl_seconds.max(1));
        Self {
            locks,
            default_ttl: Duration::from_secs(config.default_ttl_seconds.max(1)).min(max_ttl),
            max_ttl,
        }
    }

    fn effective_ttl(&self, ttl: Option<Duration>) -> AppResult<Duration> {
        match ttl {
            None => Ok(self.default_ttl),
            Some(ttl) if ttl.is_zero() => Err(AppError::validation("Lock TTL must be positive")
                .with_key("lock.invalid_ttl")),
            Some(ttl) => Ok(ttl.min(self.max_ttl)),
        }
    }

    fn validate_name(name: &str) -> AppResult<()> {
        if name.trim().is_empty() {
            return Err(AppError::validation("Lock name must not be empty")
                .with_key("lock.invalid_name"));
        }
        Ok(())
    }

    /// Try to take `name`. `None` when someone else holds an unexpired lease.
    pub async fn acquire(&self, name: &str, ttl: Option<Duration>) -> AppResult<Option<LockLease>> {
        Self::validate_name(name)?;
        let ttl = self.effective_ttl(ttl)?;
        let owner = Uuid::new_v4().to_string();

        let lease = self
            .locks
            .try_acquire(name, &owner, ttl)
            .await?
            .map(LockLease::from);
        match &lease {
            Some(l) => debug!(lock = %name, expires_at = %l.expires_at, "Lock acquired"),
            None => debug!(lock = %name, "Lock busy"),
        }
        Ok(lease)
    }

    /// Extend a held lease. `None` when the lease lapsed or was taken over.
    pub async fn renew(&self, lease: &LockLease, ttl: Option<Duration>) -> AppResult<Option<LockLease>> {
        let ttl = self.effective_ttl(ttl)?;
        Ok(self
            .locks
            .renew(&lease.name, &lease.owner, ttl)
            .await?
            .map(LockLease::from))
    }

    /// Release a held lease. Returns `false` if it was no longer held.
    pub async fn release(&self, lease: &LockLease) -> AppResult<bool> {
        let released = self.locks.release(&lease.name, &lease.owner).await?;
        debug!(lock = %lease.name, released, "Lock released");
        Ok(released)
    }

    /// Run `task` while holding `name`.
    ///
    /// Returns `Ok(None)` without running the task when the lock is busy.
    /// The lease is released whether the task succeeds or fails.
    pub async fn with_lock<F, T>(
        &self,
        name: &str,
        ttl: Option<Duration>,
        task: F,
    ) -> AppResult<Option<T>>
    where
        F: Future<Output = AppResult<T>>,
    {
        let Some(lease) = self.acquire(name, ttl).await? else {
            return Ok(None);
        };

        let outcome = task.await;

        if let Err(e) = self.release(&lease).await {
            warn!(lock = %name, error = %e, "Failed to release lock");
        }
        outcome.map(Some)
    }

    /// Unexpired leases ordered by name.
    pub async fn list_active(&self) -> AppResult<Vec<DistributedLock>> {
        self.locks.list_active().await
    }

    /// Delete expired lease rows.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        self.locks.purge_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::error::ErrorKind;
    use stowage_database::Stores;

    fn service() -> LockService {
        LockService::new(Stores::memory().locks, &LockConfig::default())
    }

    #[tokio::test]
    async fn test_held_lock_is_exclusive() {
        let svc = service();
        let lease = svc.acquire("reindex", None).await.unwrap().unwrap();
        assert!(svc.acquire("reindex", None).await.unwrap().is_none());

        assert!(svc.release(&lease).await.unwrap());
        assert!(svc.acquire("reindex", None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_release_by_other_owner_is_noop() {
        let svc = service();
        let lease = svc.acquire("job", None).await.unwrap().unwrap();
        let forged = LockLease {
            owner: "someone-else".to_string(),
            ..lease.clone()
        };
        assert!(!svc.release(&forged).await.unwrap());
        assert_eq!(svc.list_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_expired_lock_can_be_taken() {
        let svc = service();
        svc.acquire("short", Some(Duration::from_millis(20)))
            .await
            .unwrap()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(svc.acquire("short", None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ttl_validation_and_clamp() {
        let svc = LockService::new(
            Stores::memory().locks,
            &LockConfig {
                default_ttl_seconds: 30,
                max_ttl_seconds: 60,
            },
        );
        let err = svc.acquire("a", Some(Duration::ZERO)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let lease = svc
            .acquire("a", Some(Duration::from_secs(86_400)))
            .await
            .unwrap()
            .unwrap();
        assert!(lease.expires_at <= Utc::now() + chrono::Duration::seconds(61));
    }

    #[tokio::test]
    async fn test_with_lock_releases_after_error() {
        let svc = service();
        let failed: AppResult<Option<()>> = svc
            .with_lock("task", None, async { Err(AppError::internal("boom")) })
            .await;
        assert!(failed.is_err());
        assert!(svc.list_active().await.unwrap().is_empty());

        let ran = svc.with_lock("task", None, async { Ok(7) }).await.unwrap();
        assert_eq!(ran, Some(7));
    }

    #[tokio::test]
    async fn test_with_lock_skips_when_busy() {
        let svc = service();
        let _held = svc.acquire("task", None).await.unwrap().unwrap();
        let ran = svc
            .with_lock("task", None, async { Ok(()) })
            .await
            .unwrap();
        assert!(ran.is_none());
    }

    #[tokio::test]
    async fn test_renew_extends() {
        let svc = service();
        let lease = svc.acquire("r", Some(Duration::from_secs(5))).await.unwrap().unwrap();
        let renewed = svc
            .renew(&lease, Some(Duration::from_secs(60)))
            .await
            .unwrap()
            .unwrap();
        assert!(renewed.expires_at > lease.expires_at);
    }
}

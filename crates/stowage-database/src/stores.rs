//! The bundle of store trait objects handed to services.

use std::sync::Arc;

use tracing::info;

use stowage_core::config::{DatabaseConfig, DatabaseProvider};
use stowage_core::result::AppResult;

use crate::connection::DatabasePool;
use crate::memory::{
    MemoryAdminGroupStore, MemoryFileEventStore, MemoryFileOperationStore, MemoryFileStore,
    MemoryLockStore, MemoryLoginAttemptStore, MemoryRefreshTokenStore, MemoryUserAccountStore,
};
use crate::migration::run_migrations;
use crate::repositories::{
    AdminGroupRepository, FileEventRepository, FileOperationRepository, FileRepository,
    LockRepository, LoginAttemptRepository, RefreshTokenRepository, UserAccountRepository,
};
use crate::traits::{
    AdminGroupStore, FileEventStore, FileOperationStore, FileStore, LockStore, LoginAttemptStore,
    RefreshTokenStore, UserAccountStore,
};

/// One implementation of every store trait, all backed by the same
/// database (or all in memory).
#[derive(Debug, Clone)]
pub struct Stores {
    /// Accounts.
    pub users: Arc<dyn UserAccountStore>,
    /// Login attempt history.
    pub login_attempts: Arc<dyn LoginAttemptStore>,
    /// Refresh tokens.
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    /// Admin groups.
    pub admin_groups: Arc<dyn AdminGroupStore>,
    /// Files.
    pub files: Arc<dyn FileStore>,
    /// Storage events.
    pub file_events: Arc<dyn FileEventStore>,
    /// Reference operations.
    pub file_operations: Arc<dyn FileOperationStore>,
    /// Lock leases.
    pub locks: Arc<dyn LockStore>,
    pool: Option<DatabasePool>,
}

impl Stores {
    /// Connect according to `database.provider`, running migrations for
    /// PostgreSQL when `database.run_migrations` is set.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        match config.provider {
            DatabaseProvider::Memory => {
                info!("Using in-memory stores; data will not survive a restart");
                Ok(Self::memory())
            }
            DatabaseProvider::Postgres => {
                let pool = DatabasePool::connect(config).await?;
                if config.run_migrations {
                    run_migrations(pool.pool()).await?;
                }
                Ok(Self::postgres(pool))
            }
        }
    }

    /// Stores backed by PostgreSQL.
    pub fn postgres(pool: DatabasePool) -> Self {
        let pg = pool.pool().clone();
        Self {
            users: Arc::new(UserAccountRepository::new(pg.clone())),
            login_attempts: Arc::new(LoginAttemptRepository::new(pg.clone())),
            refresh_tokens: Arc::new(RefreshTokenRepository::new(pg.clone())),
            admin_groups: Arc::new(AdminGroupRepository::new(pg.clone())),
            files: Arc::new(FileRepository::new(pg.clone())),
            file_events: Arc::new(FileEventRepository::new(pg.clone())),
            file_operations: Arc::new(FileOperationRepository::new(pg.clone())),
            locks: Arc::new(LockRepository::new(pg)),
            pool: Some(pool),
        }
    }

    /// Process-local stores.
    pub fn memory() -> Self {
        Self {
            users: Arc::new(MemoryUserAccountStore::new()),
            login_attempts: Arc::new(MemoryLoginAttemptStore::new()),
            refresh_tokens: Arc::new(MemoryRefreshTokenStore::new()),
            admin_groups: Arc::new(MemoryAdminGroupStore::new()),
            files: Arc::new(MemoryFileStore::new()),
            file_events: Arc::new(MemoryFileEventStore::new()),
            file_operations: Arc::new(MemoryFileOperationStore::new()),
            locks: Arc::new(MemoryLockStore::new()),
            pool: None,
        }
    }

    /// Name of the backing implementation.
    pub fn backend_name(&self) -> &'static str {
        if self.pool.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }

    /// Check that the backing database is reachable.
    pub async fn health_check(&self) -> AppResult<bool> {
        match &self.pool {
            Some(pool) => pool.health_check().await,
            None => Ok(true),
        }
    }

    /// Close database connections, if any.
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

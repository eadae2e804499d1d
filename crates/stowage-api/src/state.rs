//! Shared application state passed to all handlers.

use std::sync::Arc;

use tracing::info;

use stowage_auth::{
    AuthManager, Jwks, JwtDecoder, JwtEncoder, JwtKeys, LockoutPolicy, PasswordHasher,
    PasswordValidator,
};
use stowage_cache::CacheManager;
use stowage_core::config::AppConfig;
use stowage_core::result::AppResult;
use stowage_database::Stores;
use stowage_service::{
    AdminGroupService, FileEventProcessor, FileOperationProcessor, FileService, LockService,
    ReferenceCounter, UserService,
};
use stowage_storage::StorageManager;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,

    // ── Infrastructure ────────────────────────────────────
    /// Store implementations (PostgreSQL or in-memory).
    pub stores: Stores,
    /// Cache manager.
    pub cache: CacheManager,
    /// Object storage provider.
    pub storage: StorageManager,

    // ── Auth ──────────────────────────────────────────────
    /// Published signing keys.
    pub jwks: Arc<Jwks>,
    /// Login, refresh and logout flows.
    pub auth_manager: Arc<AuthManager>,

    // ── Services ──────────────────────────────────────────
    /// Account administration.
    pub user_service: Arc<UserService>,
    /// Admin groups.
    pub admin_group_service: Arc<AdminGroupService>,
    /// File metadata and upload URLs.
    pub file_service: Arc<FileService>,
    /// Storage event ingestion.
    pub event_processor: Arc<FileEventProcessor>,
    /// Reference operations.
    pub operation_processor: Arc<FileOperationProcessor>,
    /// Distributed locks.
    pub lock_service: LockService,
}

impl AppState {
    /// Build every component from configuration.
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        let stores = Stores::connect(&config.database).await?;
        info!(backend = stores.backend_name(), "Stores initialized");

        let cache = CacheManager::new(&config.cache).await?;
        let storage =
            StorageManager::from_config(&config.storage, &config.server.public_base_url).await?;

        Self::from_parts(config, stores, cache, storage)
    }

    /// Assemble services over already-built infrastructure.
    pub fn from_parts(
        config: AppConfig,
        stores: Stores,
        cache: CacheManager,
        storage: StorageManager,
    ) -> AppResult<Self> {
        let keys = Arc::new(JwtKeys::from_config(&config.auth)?);
        let jwks = Arc::new(keys.jwks());
        let encoder = Arc::new(JwtEncoder::new(Arc::clone(&keys), &config.auth));
        let decoder = Arc::new(JwtDecoder::new(
            Arc::clone(&keys),
            &config.auth,
            cache.clone(),
        ));
        let hasher = Arc::new(PasswordHasher::new(&config.auth)?);
        let validator = Arc::new(PasswordValidator::new(&config.auth));

        let auth_manager = Arc::new(AuthManager::new(
            &stores,
            encoder,
            decoder,
            Arc::clone(&hasher),
            LockoutPolicy::from_config(&config.auth),
        ));

        let user_service = Arc::new(UserService::new(
            Arc::clone(&stores.users),
            hasher,
            validator,
        ));
        let admin_group_service = Arc::new(AdminGroupService::new(
            Arc::clone(&stores.admin_groups),
            Arc::clone(&stores.users),
        ));
        let file_service = Arc::new(FileService::new(
            Arc::clone(&stores.files),
            storage.clone(),
            &config.storage,
        ));
        let event_processor = Arc::new(FileEventProcessor::new(
            Arc::clone(&stores.file_events),
            Arc::clone(&stores.files),
        ));
        let operation_processor = Arc::new(FileOperationProcessor::new(
            Arc::clone(&stores.file_operations),
            Arc::clone(&stores.files),
            ReferenceCounter::new(
                Arc::clone(&stores.files),
                config.storage.reference_retry_attempts,
            ),
        ));
        let lock_service = LockService::new(Arc::clone(&stores.locks), &config.locks);

        Ok(Self {
            config: Arc::new(config),
            stores,
            cache,
            storage,
            jwks,
            auth_manager,
            user_service,
            admin_group_service,
            file_service,
            event_processor,
            operation_processor,
            lock_service,
        })
    }
}

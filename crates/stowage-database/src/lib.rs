//! # stowage-database
//!
//! Persistence for every Stowage entity. Each entity has a store trait
//! (see [`traits`]) with two implementations: a PostgreSQL repository in
//! [`repositories`] and a process-local store in [`memory`] used for
//! development and tests. [`Stores`] bundles one of each trait object,
//! chosen by `database.provider`.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod stores;
pub mod traits;

pub use connection::DatabasePool;
pub use stores::Stores;
pub use traits::{
    AdminGroupStore, Begin, FileEventStore, FileOperationStore, FileStore, LockStore,
    LoginAttemptStore, RefreshTokenStore, UserAccountStore,
};

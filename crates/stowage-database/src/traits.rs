//! Store traits: the seam between services and persistence.
//!
//! Every method is a single atomic operation against the backing store.
//! Conditional updates return `None` (or `false`) when their guard does
//! not hold instead of erroring, so callers decide how to react to a lost
//! race.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use stowage_core::result::AppResult;
use stowage_core::types::pagination::{PageRequest, PageResponse};
use stowage_entity::admin_group::{
    AdminGroup, AdminGroupMember, CreateAdminGroup, UpdateAdminGroup,
};
use stowage_entity::auth::{LoginAttempt, NewLoginAttempt, NewRefreshToken, RefreshToken};
use stowage_entity::file::{
    File, FileEvent, FileOperation, FileStatus, NewFile, NewFileEvent, NewFileOperation,
};
use stowage_entity::lock::DistributedLock;
use stowage_entity::user::{CreateUserAccount, UserAccount, UserStatus};

/// Outcome of claiming an idempotent record.
#[derive(Debug, Clone)]
pub enum Begin<T> {
    /// No record existed; one was inserted in `processing` state.
    Started(T),
    /// A `failed` record was moved back to `processing`.
    Restarted(T),
    /// The record already completed; its stored result is authoritative.
    Completed(T),
    /// Another worker holds the record in `processing` state.
    InProgress(T),
}

impl<T> Begin<T> {
    /// The record in its state after the claim.
    pub fn record(&self) -> &T {
        match self {
            Self::Started(r) | Self::Restarted(r) | Self::Completed(r) | Self::InProgress(r) => r,
        }
    }

    /// Consume the outcome, returning the record.
    pub fn into_record(self) -> T {
        match self {
            Self::Started(r) | Self::Restarted(r) | Self::Completed(r) | Self::InProgress(r) => r,
        }
    }

    /// Whether this caller now owns the record and must process it.
    pub fn is_claimed(&self) -> bool {
        matches!(self, Self::Started(_) | Self::Restarted(_))
    }
}

/// Account persistence.
#[async_trait]
pub trait UserAccountStore: Send + Sync + std::fmt::Debug {
    /// Find an account by primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserAccount>>;

    /// Find an account by username (case-insensitive).
    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserAccount>>;

    /// List accounts, optionally filtered by a substring of username,
    /// display name or email.
    async fn list(
        &self,
        search: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<UserAccount>>;

    /// Create an account. Fails with a conflict on a duplicate username.
    async fn create(&self, data: &CreateUserAccount) -> AppResult<UserAccount>;

    /// Change the account status.
    async fn update_status(&self, id: Uuid, status: UserStatus)
    -> AppResult<Option<UserAccount>>;

    /// Stamp `last_login_at` with the current time.
    async fn touch_last_login(&self, id: Uuid) -> AppResult<()>;
}

/// Login attempt history.
#[async_trait]
pub trait LoginAttemptStore: Send + Sync + std::fmt::Debug {
    /// Append an attempt.
    async fn record(&self, attempt: &NewLoginAttempt) -> AppResult<LoginAttempt>;

    /// Count failed attempts for the account from `ip_address` that happened
    /// after `since` and after the account's most recent successful login.
    async fn count_recent_failures(
        &self,
        user_account_id: Uuid,
        ip_address: &str,
        since: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Delete attempts older than `cutoff`.
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

/// Refresh token rows.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync + std::fmt::Debug {
    /// Insert a token.
    async fn create(&self, data: &NewRefreshToken) -> AppResult<RefreshToken>;

    /// Find a token by id (the JWT `jti`).
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<RefreshToken>>;

    /// Revoke a token as part of rotation. Returns `false` if the token was
    /// already revoked, meaning another request rotated it first.
    async fn revoke_for_rotation(&self, id: Uuid, replaced_by: Uuid) -> AppResult<bool>;

    /// Revoke every live token in a family. Returns the number revoked.
    async fn revoke_family(&self, family_id: Uuid) -> AppResult<u64>;

    /// Delete tokens that expired before `cutoff`.
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

/// Admin group persistence.
#[async_trait]
pub trait AdminGroupStore: Send + Sync + std::fmt::Debug {
    /// Create a group. Fails with a conflict on a duplicate name.
    async fn create(&self, data: &CreateAdminGroup) -> AppResult<AdminGroup>;

    /// Find a group by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AdminGroup>>;

    /// List groups, optionally filtered by a name substring.
    async fn list(
        &self,
        search: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AdminGroup>>;

    /// Apply a partial update.
    async fn update(&self, id: Uuid, data: &UpdateAdminGroup) -> AppResult<Option<AdminGroup>>;

    /// Delete a group and its memberships.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Add a member. Fails with a conflict if already a member.
    async fn add_member(&self, group_id: Uuid, user_account_id: Uuid)
    -> AppResult<AdminGroupMember>;

    /// Remove a member.
    async fn remove_member(&self, group_id: Uuid, user_account_id: Uuid) -> AppResult<bool>;

    /// List members of a group, oldest first.
    async fn list_members(&self, group_id: Uuid) -> AppResult<Vec<AdminGroupMember>>;
}

/// File bookkeeping.
#[async_trait]
pub trait FileStore: Send + Sync + std::fmt::Debug {
    /// Register a file. Fails with a conflict on a duplicate path.
    async fn create(&self, data: &NewFile) -> AppResult<File>;

    /// Find a file by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>>;

    /// Find a file by object key.
    async fn find_by_path(&self, file_path: &str) -> AppResult<Option<File>>;

    /// List an owner's files that are not deleted, newest first.
    async fn list_by_owner(&self, owner_id: Uuid, page: &PageRequest)
    -> AppResult<PageResponse<File>>;

    /// Add `delta` to the reference count if the stored version equals
    /// `current_version` and the count stays non-negative. Bumps the
    /// version and `last_referenced_at`. `None` when either guard fails.
    async fn update_reference_count(
        &self,
        id: Uuid,
        delta: i32,
        current_version: i64,
    ) -> AppResult<Option<File>>;

    /// Set the status under the version guard.
    async fn update_status(
        &self,
        id: Uuid,
        status: FileStatus,
        current_version: i64,
    ) -> AppResult<Option<File>>;

    /// Mark the object as stored (status `active`) and record its size,
    /// under the version guard. A `None` size keeps the previous value.
    async fn mark_stored(
        &self,
        id: Uuid,
        size_bytes: Option<i64>,
        current_version: i64,
    ) -> AppResult<Option<File>>;

    /// Files with no references, untouched since before `cutoff`, that are
    /// either abandoned uploads (`pending`) or active files whose last
    /// reference was removed. Oldest first.
    async fn list_unreferenced(&self, cutoff: DateTime<Utc>, limit: u64) -> AppResult<Vec<File>>;
}

/// Idempotent storage event records keyed by `event_id`.
#[async_trait]
pub trait FileEventStore: Send + Sync + std::fmt::Debug {
    /// Claim the event.
    async fn begin(&self, data: &NewFileEvent) -> AppResult<Begin<FileEvent>>;

    /// Find an event by its idempotency key.
    async fn find_by_event_id(&self, event_id: &str) -> AppResult<Option<FileEvent>>;

    /// Move a `processing` record to `completed` under the version guard.
    async fn complete(
        &self,
        event_id: &str,
        current_version: i64,
        result: serde_json::Value,
    ) -> AppResult<Option<FileEvent>>;

    /// Move a `processing` record to `failed` under the version guard.
    async fn fail(
        &self,
        event_id: &str,
        current_version: i64,
        error: &str,
    ) -> AppResult<Option<FileEvent>>;
}

/// Idempotent reference operations keyed by `operation_id`.
#[async_trait]
pub trait FileOperationStore: Send + Sync + std::fmt::Debug {
    /// Claim the operation.
    async fn begin(&self, data: &NewFileOperation) -> AppResult<Begin<FileOperation>>;

    /// Find an operation by its idempotency key.
    async fn find_by_operation_id(&self, operation_id: &str)
    -> AppResult<Option<FileOperation>>;

    /// Move a `processing` record to `completed` under the version guard.
    async fn complete(
        &self,
        operation_id: &str,
        current_version: i64,
        result: serde_json::Value,
    ) -> AppResult<Option<FileOperation>>;

    /// Move a `processing` record to `failed` under the version guard.
    async fn fail(
        &self,
        operation_id: &str,
        current_version: i64,
        error: &str,
    ) -> AppResult<Option<FileOperation>>;
}

/// Named leases with expiry.
///
/// An expired row behaves exactly like a missing one for every method.
#[async_trait]
pub trait LockStore: Send + Sync + std::fmt::Debug {
    /// Acquire `name` for `owner` unless another unexpired lease exists.
    async fn try_acquire(
        &self,
        name: &str,
        owner: &str,
        ttl: Duration,
    ) -> AppResult<Option<DistributedLock>>;

    /// Extend an unexpired lease held by `owner` to `now + ttl`.
    async fn renew(
        &self,
        name: &str,
        owner: &str,
        ttl: Duration,
    ) -> AppResult<Option<DistributedLock>>;

    /// Release a lease held by `owner`. No-op for anyone else.
    async fn release(&self, name: &str, owner: &str) -> AppResult<bool>;

    /// Find the unexpired lease for `name`.
    async fn find_active(&self, name: &str) -> AppResult<Option<DistributedLock>>;

    /// List unexpired leases ordered by name.
    async fn list_active(&self) -> AppResult<Vec<DistributedLock>>;

    /// Physically delete expired rows.
    async fn purge_expired(&self) -> AppResult<u64>;
}

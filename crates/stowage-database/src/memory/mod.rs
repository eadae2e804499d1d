//! Process-local implementations of the store traits.
//!
//! State lives in maps behind a `tokio::sync::RwLock`; every trait method
//! takes the lock once, so each call is atomic exactly like the single
//! SQL statement its PostgreSQL counterpart issues. Nothing is durable.

pub mod admin_group;
pub mod file;
pub mod file_event;
pub mod file_operation;
pub mod lock;
pub mod login_attempt;
pub mod refresh_token;
pub mod user;

pub use admin_group::MemoryAdminGroupStore;
pub use file::MemoryFileStore;
pub use file_event::MemoryFileEventStore;
pub use file_operation::MemoryFileOperationStore;
pub use lock::MemoryLockStore;
pub use login_attempt::MemoryLoginAttemptStore;
pub use refresh_token::MemoryRefreshTokenStore;
pub use user::MemoryUserAccountStore;

use stowage_core::types::pagination::{PageRequest, PageResponse};

/// Slice an already ordered result set into a page.
pub(crate) fn paginate<T: serde::Serialize>(items: Vec<T>, page: &PageRequest) -> PageResponse<T> {
    let total = items.len() as u64;
    let page_items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    PageResponse::new(page_items, page.page, page.page_size, total)
}

/// Case-insensitive substring match used for `search` filters.
pub(crate) fn matches_search(search: Option<&str>, fields: &[Option<&str>]) -> bool {
    let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) else {
        return true;
    };
    let term = term.to_lowercase();
    fields
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&term))
}

//! # stowage-service
//!
//! Business logic service layer for Stowage. Each service orchestrates the
//! store traits, the storage provider and the auth primitives to implement
//! an application-level use case.
//!
//! Services follow constructor injection; all dependencies are provided
//! at construction time via `Arc` references.

pub mod admin_group;
pub mod context;
pub mod file;
pub mod lock;
pub mod user;

pub use admin_group::AdminGroupService;
pub use context::RequestContext;
pub use file::{FileEventProcessor, FileOperationProcessor, FileService, ReferenceCounter};
pub use lock::{LockLease, LockService};
pub use user::UserService;

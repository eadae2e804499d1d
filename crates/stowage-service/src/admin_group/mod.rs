//! Administrative groups and their membership.

pub mod service;

pub use service::{AdminGroupService, CreateAdminGroupRequest};

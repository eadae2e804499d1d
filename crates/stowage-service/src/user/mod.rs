//! User account administration and profile lookup.

pub mod service;

pub use service::{CreateUserRequest, UserService};

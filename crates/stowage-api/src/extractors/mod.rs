//! Custom Axum extractors.

pub mod auth;
pub mod client;
pub mod json;
pub mod pagination;
pub mod path;

pub use auth::AuthUser;
pub use client::ClientInfo;
pub use json::ValidatedJson;
pub use pagination::PaginationParams;

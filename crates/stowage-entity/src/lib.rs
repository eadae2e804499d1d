//! # stowage-entity
//!
//! Domain entity models for Stowage. Every struct in this crate represents
//! a database table row or the input needed to create one. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and table rows
//! additionally derive `sqlx::FromRow`.

pub mod admin_group;
pub mod auth;
pub mod file;
pub mod lock;
pub mod processing;
pub mod user;

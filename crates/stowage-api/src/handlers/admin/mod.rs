//! Admin-only handlers.

pub mod groups;
pub mod locks;
pub mod users;

//! User account entities.

pub mod model;
pub mod role;
pub mod status;

pub use model::{CreateUserAccount, UserAccount};
pub use role::UserRole;
pub use status::UserStatus;

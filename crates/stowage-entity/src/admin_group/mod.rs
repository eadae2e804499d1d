//! Administrative group entities.

pub mod member;
pub mod model;

pub use member::AdminGroupMember;
pub use model::{AdminGroup, CreateAdminGroup, UpdateAdminGroup};

//! Authentication bookkeeping entities.

pub mod login_attempt;
pub mod refresh_token;

pub use login_attempt::{LoginAttempt, NewLoginAttempt};
pub use refresh_token::{NewRefreshToken, RefreshToken};

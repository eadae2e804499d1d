//! # stowage-auth
//!
//! Authentication for Stowage.
//!
//! ## Modules
//!
//! - `jwt`: token claims, signing keys, encoding and validation with blocklist
//! - `jwks`: JSON Web Key Set for the Ed25519 public key
//! - `password`: Argon2id password hashing and policy enforcement
//! - `lockout`: failed-login lockout policy
//! - `session`: login, refresh-token rotation and logout

pub mod jwks;
pub mod jwt;
pub mod lockout;
pub mod password;
pub mod session;

pub use jwks::{Jwk, Jwks};
pub use jwt::{Claims, JwtDecoder, JwtEncoder, JwtKeys, TokenPair, TokenType};
pub use lockout::LockoutPolicy;
pub use password::{PasswordHasher, PasswordValidator};
pub use session::{AuthManager, LoginResult};

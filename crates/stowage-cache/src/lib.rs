//! # stowage-cache
//!
//! Cache provider implementations for Stowage. Supports two modes:
//!
//! - **memory**: In-process cache using [moka](https://crates.io/crates/moka)
//! - **redis**: Redis-backed cache using the [redis](https://crates.io/crates/redis) crate
//!
//! The provider is selected at runtime based on configuration. The cache
//! holds short-lived security state only (revoked access tokens, consumed
//! upload tokens), so losing it on restart with the memory provider shortens
//! revocation to the token's natural expiry.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::CacheManager;

//! Distributed lock configuration.

use serde::{Deserialize, Serialize};

/// Lease settings for distributed locks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Lease duration applied when a caller does not pass one.
    #[serde(default = "default_ttl")]
    pub default_ttl_seconds: u64,
    /// Upper bound accepted for caller-supplied leases.
    #[serde(default = "default_max_ttl")]
    pub max_ttl_seconds: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: default_ttl(),
            max_ttl_seconds: default_max_ttl(),
        }
    }
}

fn default_ttl() -> u64 {
    30
}

fn default_max_ttl() -> u64 {
    3600
}

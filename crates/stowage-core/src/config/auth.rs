//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Token signing algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// HMAC-SHA256 with a shared secret.
    #[default]
    #[serde(rename = "HS256")]
    Hs256,
    /// Ed25519 with a PEM key pair; public key published as JWKS.
    #[serde(rename = "EdDSA")]
    EdDsa,
}

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Token signing algorithm.
    #[serde(default)]
    pub algorithm: SigningAlgorithm,
    /// Secret key for HS256 signing.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// PKCS#8 PEM private key path (EdDSA).
    #[serde(default)]
    pub private_key_path: String,
    /// SubjectPublicKeyInfo PEM public key path (EdDSA).
    #[serde(default)]
    pub public_key_path: String,
    /// `iss` claim written into issued tokens.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Refresh token TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_hours: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Failed logins from one IP that lock the account.
    #[serde(default = "default_max_failed")]
    pub max_failed_attempts: u32,
    /// Window in minutes over which failures are counted.
    #[serde(default = "default_lockout")]
    pub lockout_duration_minutes: u64,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_argon2_memory")]
    pub argon2_memory_kib: u32,
    /// Argon2 iteration count.
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            algorithm: SigningAlgorithm::default(),
            jwt_secret: default_jwt_secret(),
            private_key_path: String::new(),
            public_key_path: String::new(),
            issuer: default_issuer(),
            access_ttl_minutes: default_access_ttl(),
            refresh_ttl_hours: default_refresh_ttl(),
            password_min_length: default_password_min(),
            max_failed_attempts: default_max_failed(),
            lockout_duration_minutes: default_lockout(),
            argon2_memory_kib: default_argon2_memory(),
            argon2_iterations: default_argon2_iterations(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_issuer() -> String {
    "stowage".to_string()
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    24 * 7
}

fn default_password_min() -> usize {
    10
}

fn default_max_failed() -> u32 {
    5
}

fn default_lockout() -> u64 {
    15
}

fn default_argon2_memory() -> u32 {
    19_456
}

fn default_argon2_iterations() -> u32 {
    2
}

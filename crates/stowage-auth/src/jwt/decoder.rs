//! JWT token validation and blocklist checking.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Validation, decode};
use uuid::Uuid;

use stowage_cache::keys;
use stowage_cache::provider::CacheManager;
use stowage_core::config::AuthConfig;
use stowage_core::error::{AppError, ErrorKind};
use stowage_core::traits::CacheProvider;

use super::claims::{Claims, TokenType};
use super::keys::JwtKeys;

/// Allowed clock skew in seconds.
const LEEWAY_SECONDS: u64 = 5;

/// Validates JWT tokens and checks blocklist status.
#[derive(Clone)]
pub struct JwtDecoder {
    /// Verification keys.
    keys: Arc<JwtKeys>,
    /// Validation configuration.
    validation: Validation,
    /// Cache manager for blocklist lookups.
    cache: CacheManager,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("keys", &self.keys)
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(keys: Arc<JwtKeys>, config: &AuthConfig, cache: CacheManager) -> Self {
        let mut validation = Validation::new(keys.algorithm());
        validation.validate_exp = true;
        validation.leeway = LEEWAY_SECONDS;
        validation.set_issuer(&[config.issuer.as_str()]);

        Self {
            keys,
            validation,
            cache,
        }
    }

    /// Decodes and validates an access token string.
    ///
    /// Checks:
    /// 1. Signature validity
    /// 2. Expiration and issuer
    /// 3. Token type is Access
    /// 4. JTI not in blocklist
    pub async fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode_token(token)?;

        if claims.token_type != TokenType::Access {
            return Err(AppError::authentication(
                "Invalid token type: expected access token",
            )
            .with_key("auth.invalid_token"));
        }

        self.check_blocklist(&claims.jti).await?;

        Ok(claims)
    }

    /// Decodes and validates a refresh token string.
    ///
    /// Revocation of refresh tokens is tracked in the database, not the
    /// blocklist.
    pub fn decode_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode_token(token)?;

        if claims.token_type != TokenType::Refresh {
            return Err(AppError::authentication(
                "Invalid token type: expected refresh token",
            )
            .with_key("auth.invalid_token"));
        }

        Ok(claims)
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(token, self.keys.decoding_key(), &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::authentication("Token has expired").with_key("auth.token_expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::authentication("Invalid token signature")
                        .with_key("auth.invalid_token")
                }
                _ => AppError::authentication(format!("Token validation failed: {e}"))
                    .with_key("auth.invalid_token"),
            })?;

        Ok(token_data.claims)
    }

    /// Checks whether the given JWT ID has been blocklisted.
    ///
    /// A cache outage fails closed.
    async fn check_blocklist(&self, jti: &Uuid) -> Result<(), AppError> {
        let blocked = self
            .cache
            .exists(&keys::jwt_blocklist(jti))
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ServiceUnavailable,
                    "Token revocation state is unavailable",
                    e,
                )
            })?;
        if blocked {
            return Err(AppError::authentication("Token has been revoked")
                .with_key("auth.token_revoked"));
        }
        Ok(())
    }

    /// Adds an access token to the blocklist until it would have expired.
    pub async fn blocklist_token(&self, claims: &Claims) -> Result<(), AppError> {
        // Cover the leeway window too, or the token would be accepted again
        // for a few seconds after its entry expires.
        let ttl = Duration::from_secs(claims.remaining_ttl_seconds() + LEEWAY_SECONDS);
        self.cache
            .set(&keys::jwt_blocklist(claims.jti), "revoked", ttl)
            .await
    }
}

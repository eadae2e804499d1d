//! JWT token creation with configurable signing and TTL.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::encode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stowage_core::config::AuthConfig;
use stowage_core::error::{AppError, ErrorKind};
use stowage_entity::user::UserAccount;

use super::claims::{Claims, TokenType};
use super::keys::JwtKeys;

/// Creates signed JWT access and refresh tokens.
#[derive(Debug, Clone)]
pub struct JwtEncoder {
    /// Signing keys.
    keys: Arc<JwtKeys>,
    /// `iss` claim.
    issuer: String,
    /// Access token TTL in minutes.
    access_ttl_minutes: i64,
    /// Refresh token TTL in hours.
    refresh_ttl_hours: i64,
}

/// Result of a successful token pair generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Access token expiration timestamp.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration timestamp.
    pub refresh_expires_at: DateTime<Utc>,
    /// `jti` of the refresh token, which is its row id.
    #[serde(skip)]
    pub refresh_token_id: Uuid,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(keys: Arc<JwtKeys>, config: &AuthConfig) -> Self {
        Self {
            keys,
            issuer: config.issuer.clone(),
            access_ttl_minutes: config.access_ttl_minutes as i64,
            refresh_ttl_hours: config.refresh_ttl_hours as i64,
        }
    }

    /// Generates a new access + refresh token pair in `family_id`.
    pub fn generate_token_pair(
        &self,
        user: &UserAccount,
        family_id: Uuid,
    ) -> Result<TokenPair, AppError> {
        let (access_token, access_claims) = self.generate_access_token(user, family_id)?;
        let (refresh_token, refresh_claims) = self.generate_refresh_token(user, family_id)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at: access_claims.expires_at(),
            refresh_expires_at: refresh_claims.expires_at(),
            refresh_token_id: refresh_claims.jti,
        })
    }

    /// Generates a standalone access token.
    pub fn generate_access_token(
        &self,
        user: &UserAccount,
        family_id: Uuid,
    ) -> Result<(String, Claims), AppError> {
        let ttl = chrono::Duration::minutes(self.access_ttl_minutes);
        self.sign(user, family_id, TokenType::Access, ttl)
    }

    /// Generates a standalone refresh token.
    pub fn generate_refresh_token(
        &self,
        user: &UserAccount,
        family_id: Uuid,
    ) -> Result<(String, Claims), AppError> {
        let ttl = chrono::Duration::hours(self.refresh_ttl_hours);
        self.sign(user, family_id, TokenType::Refresh, ttl)
    }

    fn sign(
        &self,
        user: &UserAccount,
        family_id: Uuid,
        token_type: TokenType,
        ttl: chrono::Duration,
    ) -> Result<(String, Claims), AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            sid: family_id,
            role: user.role,
            username: user.username.clone(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4(),
            token_type,
        };

        let token = encode(&self.keys.header(), &claims, self.keys.encoding_key()).map_err(|e| {
            AppError::with_source(
                ErrorKind::Internal,
                format!("Failed to encode {token_type:?} token"),
                e,
            )
        })?;

        Ok((token, claims))
    }
}

//! Signed upload tokens for the local storage provider.
//!
//! A token authorizes exactly one `PUT` of one object path with one content
//! type until it expires. Single use is enforced by the caller through the
//! cache (see `stowage_cache::keys::upload_token_used`).

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;

/// Audience claim that keeps upload tokens apart from auth tokens signed
/// with a shared secret.
const UPLOAD_AUDIENCE: &str = "stowage-upload";

/// Claims carried by an upload token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadClaims {
    /// Object path the token is valid for.
    pub sub: String,
    /// Content type the client declared.
    pub content_type: String,
    /// Audience, always `stowage-upload`.
    pub aud: String,
    /// Expiration (seconds since epoch).
    pub exp: i64,
    /// Unique token ID.
    pub jti: Uuid,
}

/// Issues and verifies HS256 upload tokens.
#[derive(Clone)]
pub struct UploadTokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for UploadTokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadTokenSigner").finish_non_exhaustive()
    }
}

impl UploadTokenSigner {
    /// Create a signer from the shared secret.
    pub fn new(secret: &str) -> AppResult<Self> {
        if secret.is_empty() {
            return Err(AppError::configuration(
                "storage.local.signing_secret must not be empty",
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(&[UPLOAD_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "aud", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Sign a token for `path`, returning the token and its expiry.
    pub fn sign(
        &self,
        path: &str,
        content_type: &str,
        ttl: Duration,
    ) -> AppResult<(String, DateTime<Utc>)> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AppError::with_source(ErrorKind::Configuration, "Invalid upload TTL", e))?;
        let expires_at = Utc::now() + ttl;

        let claims = UploadClaims {
            sub: path.to_string(),
            content_type: content_type.to_string(),
            aud: UPLOAD_AUDIENCE.to_string(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to sign upload token", e))?;

        Ok((token, expires_at))
    }

    /// Verify a token and check that it was issued for `path`.
    pub fn verify(&self, token: &str, path: &str) -> AppResult<UploadClaims> {
        let data = decode::<UploadClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::authentication("Upload URL has expired").with_key("upload.expired")
                }
                _ => AppError::authentication(format!("Invalid upload token: {e}"))
                    .with_key("upload.invalid_token"),
            },
        )?;

        if data.claims.sub != path {
            return Err(AppError::authorization("Upload token was issued for another path")
                .with_key("upload.path_mismatch"));
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let signer = UploadTokenSigner::new("secret").unwrap();
        let (token, expires_at) = signer
            .sign("u1/abc/report.pdf", "application/pdf", Duration::from_secs(60))
            .unwrap();

        let claims = signer.verify(&token, "u1/abc/report.pdf").unwrap();
        assert_eq!(claims.content_type, "application/pdf");
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_rejects_other_path() {
        let signer = UploadTokenSigner::new("secret").unwrap();
        let (token, _) = signer
            .sign("u1/abc/a.txt", "text/plain", Duration::from_secs(60))
            .unwrap();

        let err = signer.verify(&token, "u1/abc/b.txt").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[test]
    fn test_rejects_foreign_secret() {
        let signer = UploadTokenSigner::new("secret").unwrap();
        let other = UploadTokenSigner::new("other").unwrap();
        let (token, _) = other
            .sign("u1/abc/a.txt", "text/plain", Duration::from_secs(60))
            .unwrap();

        let err = signer.verify(&token, "u1/abc/a.txt").unwrap_err();
        assert_eq!(err.message_key.as_deref(), Some("upload.invalid_token"));
    }

    #[test]
    fn test_empty_secret_is_configuration_error() {
        let err = UploadTokenSigner::new("").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}

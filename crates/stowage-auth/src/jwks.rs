//! JSON Web Key Set for the Ed25519 token signing key.
//!
//! Only `OKP` / `Ed25519` keys are produced. The key ID is the RFC 7638
//! thumbprint of the public key, which is also written into the `kid`
//! header of every EdDSA-signed token.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;

/// DER prefix of an Ed25519 SubjectPublicKeyInfo (RFC 8410).
const ED25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

/// Length of a raw Ed25519 public key.
const ED25519_KEY_LEN: usize = 32;

/// A single public JWK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type, always `OKP`.
    pub kty: String,
    /// Curve, always `Ed25519`.
    pub crv: String,
    /// Base64url public key bytes.
    pub x: String,
    /// RFC 7638 thumbprint.
    pub kid: String,
    /// Intended algorithm.
    pub alg: String,
    /// Intended use.
    #[serde(rename = "use")]
    pub key_use: String,
}

impl Jwk {
    /// Build a JWK from a PEM-encoded Ed25519 SubjectPublicKeyInfo.
    pub fn from_public_key_pem(pem: &str) -> AppResult<Self> {
        let der = decode_pem(pem, "PUBLIC KEY")?;
        if der.len() != ED25519_SPKI_PREFIX.len() + ED25519_KEY_LEN
            || der[..ED25519_SPKI_PREFIX.len()] != ED25519_SPKI_PREFIX
        {
            return Err(AppError::configuration(
                "Public key is not an Ed25519 SubjectPublicKeyInfo",
            ));
        }

        let x = URL_SAFE_NO_PAD.encode(&der[ED25519_SPKI_PREFIX.len()..]);
        let kid = thumbprint(&x);

        Ok(Self {
            kty: "OKP".to_string(),
            crv: "Ed25519".to_string(),
            x,
            kid,
            alg: "EdDSA".to_string(),
            key_use: "sig".to_string(),
        })
    }
}

/// A JWKS document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    /// Published keys.
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// Build a single-key set from a PEM public key.
    pub fn from_public_key_pem(pem: &str) -> AppResult<Self> {
        Ok(Self {
            keys: vec![Jwk::from_public_key_pem(pem)?],
        })
    }

    /// An empty set, published when tokens are HMAC-signed.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// RFC 7638 thumbprint over the required OKP members in lexicographic order.
fn thumbprint(x: &str) -> String {
    let canonical = format!(r#"{{"crv":"Ed25519","kty":"OKP","x":"{x}"}}"#);
    URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
}

/// Extract and decode the base64 body of a PEM block with the given label.
fn decode_pem(pem: &str, label: &str) -> AppResult<Vec<u8>> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");

    let start = pem
        .find(&begin)
        .ok_or_else(|| AppError::configuration(format!("Missing PEM header: {begin}")))?;
    let body_start = start + begin.len();
    let body_end = pem[body_start..]
        .find(&end)
        .map(|i| body_start + i)
        .ok_or_else(|| AppError::configuration(format!("Missing PEM footer: {end}")))?;

    let body: String = pem[body_start..body_end]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    STANDARD
        .decode(body)
        .map_err(|e| AppError::with_source(ErrorKind::Configuration, "Invalid PEM body", e))
}

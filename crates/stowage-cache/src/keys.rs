//! Cache key builders for all Stowage cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses. Providers add their own
//! namespace prefix on top.

use std::fmt::Display;

/// Cache key for a revoked access token, by `jti`.
pub fn jwt_blocklist(jti: impl Display) -> String {
    format!("jwt:blocked:{jti}")
}

/// Cache key marking a single-use upload token as consumed, by `jti`.
pub fn upload_token_used(jti: impl Display) -> String {
    format!("upload:used:{jti}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shapes() {
        assert_eq!(jwt_blocklist("abc"), "jwt:blocked:abc");
        assert_eq!(upload_token_used(42), "upload:used:42");
    }
}

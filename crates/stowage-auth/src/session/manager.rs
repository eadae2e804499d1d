//! Authentication lifecycle manager: login, refresh token rotation, logout
//! and lockout bookkeeping.

use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_database::Stores;
use stowage_database::traits::{LoginAttemptStore, RefreshTokenStore, UserAccountStore};
use stowage_entity::auth::{NewLoginAttempt, NewRefreshToken};
use stowage_entity::user::UserAccount;

use crate::jwt::encoder::TokenPair;
use crate::jwt::{Claims, JwtDecoder, JwtEncoder};
use crate::lockout::LockoutPolicy;
use crate::password::PasswordHasher;

/// Result of a successful login or refresh.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoginResult {
    /// Generated token pair.
    pub tokens: TokenPair,
    /// The authenticated user.
    pub user: UserAccount,
}

/// Manages the complete authentication lifecycle.
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserAccountStore>,
    login_attempts: Arc<dyn LoginAttemptStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    jwt_encoder: Arc<JwtEncoder>,
    jwt_decoder: Arc<JwtDecoder>,
    password_hasher: Arc<PasswordHasher>,
    lockout: LockoutPolicy,
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("lockout", &self.lockout)
            .finish_non_exhaustive()
    }
}

fn invalid_credentials() -> AppError {
    AppError::authentication("Invalid username or password").with_key("auth.invalid_credentials")
}

fn invalid_refresh_token() -> AppError {
    AppError::authentication("Invalid refresh token").with_key("auth.invalid_refresh_token")
}

/// SHA-256 hex digest of an encoded token.
fn hash_token(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

impl AuthManager {
    /// Creates a new auth manager.
    pub fn new(
        stores: &Stores,
        jwt_encoder: Arc<JwtEncoder>,
        jwt_decoder: Arc<JwtDecoder>,
        password_hasher: Arc<PasswordHasher>,
        lockout: LockoutPolicy,
    ) -> Self {
        Self {
            users: stores.users.clone(),
            login_attempts: stores.login_attempts.clone(),
            refresh_tokens: stores.refresh_tokens.clone(),
            jwt_encoder,
            jwt_decoder,
            password_hasher,
            lockout,
        }
    }

    /// Token decoder used by the request authentication extractor.
    pub fn decoder(&self) -> &JwtDecoder {
        &self.jwt_decoder
    }

    /// Performs the login flow:
    ///
    /// 1. Resolve the account (unknown usernames are recorded as failures)
    /// 2. Refuse while locked out for this address
    /// 3. Refuse disabled accounts
    /// 4. Verify the password, recording the attempt either way
    /// 5. Start a new refresh family and issue a token pair
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> AppResult<LoginResult> {
        let username = username.trim();

        let Some(user) = self.users.find_by_username(username).await? else {
            self.record_login_attempt(None, username, ip_address, false)
                .await?;
            warn!(username, ip = ip_address, "Login failed: unknown user");
            return Err(invalid_credentials());
        };

        if self.is_user_locked_out(user.id, ip_address).await? {
            warn!(user_id = %user.id, ip = ip_address, "Login refused: locked out");
            return Err(AppError::rate_limit(
                "Too many failed login attempts. Try again later.",
            )
            .with_key("auth.locked_out"));
        }

        if !user.can_login() {
            warn!(user_id = %user.id, "Login refused: account disabled");
            return Err(AppError::authentication("Account is disabled")
                .with_key("auth.account_disabled"));
        }

        if !self
            .password_hasher
            .verify_password(password, &user.password_hash)?
        {
            self.record_login_attempt(Some(user.id), username, ip_address, false)
                .await?;
            warn!(user_id = %user.id, ip = ip_address, "Login failed: bad password");
            return Err(invalid_credentials());
        }

        self.record_login_attempt(Some(user.id), username, ip_address, true)
            .await?;
        self.users.touch_last_login(user.id).await?;

        let family_id = Uuid::new_v4();
        let tokens = self
            .issue_tokens(&user, family_id, ip_address, user_agent)
            .await?;

        info!(user_id = %user.id, family_id = %family_id, "Login successful");
        Ok(LoginResult { tokens, user })
    }

    /// Exchanges a refresh token for a new pair in the same family.
    ///
    /// Presenting a token that was already rotated or revoked is treated as
    /// theft: the whole family is revoked.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> AppResult<LoginResult> {
        let claims = self.jwt_decoder.decode_refresh_token(refresh_token)?;

        let stored = self
            .refresh_tokens
            .find_by_id(claims.jti)
            .await?
            .ok_or_else(invalid_refresh_token)?;

        if stored.token_hash != hash_token(refresh_token) || stored.user_account_id != claims.sub {
            return Err(invalid_refresh_token());
        }

        if stored.is_revoked() {
            let revoked = self.refresh_tokens.revoke_family(stored.family_id).await?;
            warn!(
                user_id = %stored.user_account_id,
                family_id = %stored.family_id,
                revoked,
                "Refresh token reuse detected; family revoked"
            );
            return Err(AppError::authentication("Refresh token has already been used")
                .with_key("auth.refresh_token_reused"));
        }

        if stored.is_expired(Utc::now()) {
            return Err(AppError::authentication("Refresh token has expired")
                .with_key("auth.token_expired"));
        }

        let user = match self.users.find_by_id(stored.user_account_id).await? {
            Some(user) if user.can_login() => user,
            _ => {
                self.refresh_tokens.revoke_family(stored.family_id).await?;
                return Err(AppError::authentication("Account is disabled")
                    .with_key("auth.account_disabled"));
            }
        };

        let tokens = self.jwt_encoder.generate_token_pair(&user, stored.family_id)?;

        if !self
            .refresh_tokens
            .revoke_for_rotation(stored.id, tokens.refresh_token_id)
            .await?
        {
            // Another request rotated this token first.
            self.refresh_tokens.revoke_family(stored.family_id).await?;
            warn!(family_id = %stored.family_id, "Concurrent refresh detected; family revoked");
            return Err(AppError::authentication("Refresh token has already been used")
                .with_key("auth.refresh_token_reused"));
        }

        self.store_refresh_token(&user, stored.family_id, &tokens, ip_address, user_agent)
            .await?;

        info!(user_id = %user.id, family_id = %stored.family_id, "Refresh token rotated");
        Ok(LoginResult { tokens, user })
    }

    /// Ends the session: the access token is blocklisted for its remaining
    /// lifetime and the refresh family is revoked.
    pub async fn logout(&self, claims: &Claims) -> AppResult<()> {
        self.jwt_decoder.blocklist_token(claims).await?;
        let revoked = self.refresh_tokens.revoke_family(claims.sid).await?;
        info!(user_id = %claims.sub, family_id = %claims.sid, revoked, "Logout");
        Ok(())
    }

    /// Whether `user_account_id` is locked out for logins from `ip_address`.
    pub async fn is_user_locked_out(&self, user_account_id: Uuid, ip_address: &str) -> AppResult<bool> {
        let since = self.lockout.window_start(Utc::now());
        let failures = self
            .login_attempts
            .count_recent_failures(user_account_id, ip_address, since)
            .await?;
        Ok(self.lockout.is_locked(failures))
    }

    /// Persists one login attempt.
    pub async fn record_login_attempt(
        &self,
        user_account_id: Option<Uuid>,
        username: &str,
        ip_address: &str,
        successful: bool,
    ) -> AppResult<()> {
        self.login_attempts
            .record(&NewLoginAttempt {
                user_account_id,
                username: username.to_string(),
                ip_address: ip_address.to_string(),
                successful,
            })
            .await?;
        Ok(())
    }

    async fn issue_tokens(
        &self,
        user: &UserAccount,
        family_id: Uuid,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> AppResult<TokenPair> {
        let tokens = self.jwt_encoder.generate_token_pair(user, family_id)?;
        self.store_refresh_token(user, family_id, &tokens, ip_address, user_agent)
            .await?;
        Ok(tokens)
    }

    async fn store_refresh_token(
        &self,
        user: &UserAccount,
        family_id: Uuid,
        tokens: &TokenPair,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> AppResult<()> {
        self.refresh_tokens
            .create(&NewRefreshToken {
                id: tokens.refresh_token_id,
                user_account_id: user.id,
                family_id,
                token_hash: hash_token(&tokens.refresh_token),
                expires_at: tokens.refresh_expires_at,
                ip_address: Some(ip_address.to_string()),
                user_agent: user_agent.map(str::to_string),
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_cache::CacheManager;
    use stowage_core::config::{AuthConfig, CacheConfig};
    use stowage_core::error::ErrorKind;
    use stowage_entity::user::{CreateUserAccount, UserRole, UserStatus};

    use crate::jwt::JwtKeys;

    const PASSWORD: &str = "Glacier-Harbor-Quiet-7!";

    struct Fixture {
        manager: AuthManager,
        stores: Stores,
        user: UserAccount,
    }

    async fn fixture(max_failed_attempts: u32) -> Fixture {
        let config = AuthConfig {
            max_failed_attempts,
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            ..AuthConfig::default()
        };
        let stores = Stores::memory();
        let cache = CacheManager::new(&CacheConfig::default()).await.unwrap();
        let keys = Arc::new(JwtKeys::hs256("test-secret").unwrap());
        let hasher = Arc::new(PasswordHasher::new(&config).unwrap());

        let user = stores
            .users
            .create(&CreateUserAccount {
                username: "alice".to_string(),
                email: None,
                password_hash: hasher.hash_password(PASSWORD).unwrap(),
                display_name: None,
                role: UserRole::Member,
            })
            .await
            .unwrap();

        let manager = AuthManager::new(
            &stores,
            Arc::new(JwtEncoder::new(keys.clone(), &config)),
            Arc::new(JwtDecoder::new(keys, &config, cache)),
            hasher,
            LockoutPolicy::from_config(&config),
        );

        Fixture {
            manager,
            stores,
            user,
        }
    }

    #[tokio::test]
    async fn test_login_success_updates_last_login() {
        let f = fixture(5).await;
        let result = f.manager.login("Alice", PASSWORD, "10.0.0.1", None).await.unwrap();
        assert_eq!(result.user.id, f.user.id);

        let stored = f.stores.users.find_by_id(f.user.id).await.unwrap().unwrap();
        assert!(stored.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_unknown_user_is_invalid_credentials() {
        let f = fixture(5).await;
        let err = f.manager.login("nobody", PASSWORD, "ip", None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(err.message_key.as_deref(), Some("auth.invalid_credentials"));
    }

    #[tokio::test]
    async fn test_lockout_after_failures_and_cleared_by_success() {
        let f = fixture(3).await;
        for _ in 0..3 {
            f.manager.login("alice", "wrong", "10.0.0.1", None).await.unwrap_err();
        }

        let err = f.manager.login("alice", PASSWORD, "10.0.0.1", None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimit);
        assert_eq!(err.message_key.as_deref(), Some("auth.locked_out"));

        // Other addresses are unaffected, and their success clears the lock.
        f.manager.login("alice", PASSWORD, "10.0.0.2", None).await.unwrap();
        assert!(!f.manager.is_user_locked_out(f.user.id, "10.0.0.1").await.unwrap());
    }

    #[tokio::test]
    async fn test_disabled_account_refused() {
        let f = fixture(5).await;
        f.stores
            .users
            .update_status(f.user.id, UserStatus::Disabled)
            .await
            .unwrap();

        let err = f.manager.login("alice", PASSWORD, "ip", None).await.unwrap_err();
        assert_eq!(err.message_key.as_deref(), Some("auth.account_disabled"));
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_reuse_revokes_family() {
        let f = fixture(5).await;
        let first = f.manager.login("alice", PASSWORD, "ip", None).await.unwrap();

        let second = f
            .manager
            .refresh(&first.tokens.refresh_token, "ip", None)
            .await
            .unwrap();
        assert_ne!(second.tokens.refresh_token, first.tokens.refresh_token);

        let err = f
            .manager
            .refresh(&first.tokens.refresh_token, "ip", None)
            .await
            .unwrap_err();
        assert_eq!(err.message_key.as_deref(), Some("auth.refresh_token_reused"));

        // The replacement was revoked along with the family.
        let err = f
            .manager
            .refresh(&second.tokens.refresh_token, "ip", None)
            .await
            .unwrap_err();
        assert_eq!(err.message_key.as_deref(), Some("auth.refresh_token_reused"));
    }

    #[tokio::test]
    async fn test_logout_rejects_access_and_refresh() {
        let f = fixture(5).await;
        let login = f.manager.login("alice", PASSWORD, "ip", None).await.unwrap();
        let claims = f
            .manager
            .decoder()
            .decode_access_token(&login.tokens.access_token)
            .await
            .unwrap();

        f.manager.logout(&claims).await.unwrap();

        assert!(
            f.manager
                .decoder()
                .decode_access_token(&login.tokens.access_token)
                .await
                .is_err()
        );
        assert!(
            f.manager
                .refresh(&login.tokens.refresh_token, "ip", None)
                .await
                .is_err()
        );
    }

    #[test]
    fn test_hash_token_is_hex_sha256() {
        let digest = hash_token("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}

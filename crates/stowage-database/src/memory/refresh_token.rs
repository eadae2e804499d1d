//! In-memory refresh token store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use stowage_core::result::AppResult;
use stowage_entity::auth::{NewRefreshToken, RefreshToken};

use crate::traits::RefreshTokenStore;

/// Refresh tokens keyed by id.
#[derive(Debug, Default)]
pub struct MemoryRefreshTokenStore {
    rows: RwLock<HashMap<Uuid, RefreshToken>>,
}

impl MemoryRefreshTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn create(&self, data: &NewRefreshToken) -> AppResult<RefreshToken> {
        let token = RefreshToken {
            id: data.id,
            user_account_id: data.user_account_id,
            family_id: data.family_id,
            token_hash: data.token_hash.clone(),
            expires_at: data.expires_at,
            revoked_at: None,
            replaced_by: None,
            ip_address: data.ip_address.clone(),
            user_agent: data.user_agent.clone(),
            created_at: Utc::now(),
        };
        self.rows.write().await.insert(token.id, token.clone());
        Ok(token)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<RefreshToken>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn revoke_for_rotation(&self, id: Uuid, replaced_by: Uuid) -> AppResult<bool> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&id) {
            Some(token) if token.revoked_at.is_none() => {
                token.revoked_at = Some(Utc::now());
                token.replaced_by = Some(replaced_by);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_family(&self, family_id: Uuid) -> AppResult<u64> {
        let now = Utc::now();
        let mut rows = self.rows.write().await;
        let mut revoked = 0;
        for token in rows
            .values_mut()
            .filter(|t| t.family_id == family_id && t.revoked_at.is_none())
        {
            token.revoked_at = Some(now);
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, t| t.expires_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

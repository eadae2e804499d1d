//! In-memory account store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::types::pagination::{PageRequest, PageResponse};
use stowage_entity::user::{CreateUserAccount, UserAccount, UserStatus};

use super::{matches_search, paginate};
use crate::traits::UserAccountStore;

/// Accounts keyed by id.
#[derive(Debug, Default)]
pub struct MemoryUserAccountStore {
    rows: RwLock<HashMap<Uuid, UserAccount>>,
}

impl MemoryUserAccountStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserAccountStore for MemoryUserAccountStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserAccount>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserAccount>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn list(
        &self,
        search: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<UserAccount>> {
        let rows = self.rows.read().await;
        let mut users: Vec<UserAccount> = rows
            .values()
            .filter(|u| {
                matches_search(
                    search,
                    &[
                        Some(u.username.as_str()),
                        u.display_name.as_deref(),
                        u.email.as_deref(),
                    ],
                )
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(users, page))
    }

    async fn create(&self, data: &CreateUserAccount) -> AppResult<UserAccount> {
        let mut rows = self.rows.write().await;
        if rows
            .values()
            .any(|u| u.username.eq_ignore_ascii_case(&data.username))
        {
            return Err(
                AppError::conflict(format!("Username '{}' already exists", data.username))
                    .with_key("user.username_taken"),
            );
        }

        let now = Utc::now();
        let user = UserAccount {
            id: Uuid::new_v4(),
            username: data.username.clone(),
            email: data.email.clone(),
            password_hash: data.password_hash.clone(),
            display_name: data.display_name.clone(),
            role: data.role,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: UserStatus,
    ) -> AppResult<Option<UserAccount>> {
        let mut rows = self.rows.write().await;
        Ok(rows.get_mut(&id).map(|user| {
            user.status = status;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn touch_last_login(&self, id: Uuid) -> AppResult<()> {
        if let Some(user) = self.rows.write().await.get_mut(&id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }
}

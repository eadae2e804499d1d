//! Account repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_core::types::pagination::{PageRequest, PageResponse};
use stowage_entity::user::{CreateUserAccount, UserAccount, UserStatus};

use super::like_pattern;
use crate::traits::UserAccountStore;

/// Repository for account CRUD and query operations.
#[derive(Debug, Clone)]
pub struct UserAccountRepository {
    pool: PgPool,
}

impl UserAccountRepository {
    /// Create a new account repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserAccountStore for UserAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserAccount>> {
        sqlx::query_as::<_, UserAccount>("SELECT * FROM user_accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find account by id", e)
            })
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserAccount>> {
        sqlx::query_as::<_, UserAccount>(
            "SELECT * FROM user_accounts WHERE LOWER(username) = LOWER($1)",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find account by username", e)
        })
    }

    async fn list(
        &self,
        search: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<UserAccount>> {
        let pattern = like_pattern(search);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_accounts \
             WHERE $1::text IS NULL OR username ILIKE $1 OR display_name ILIKE $1 OR email ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count accounts", e))?;

        let users = sqlx::query_as::<_, UserAccount>(
            "SELECT * FROM user_accounts \
             WHERE $1::text IS NULL OR username ILIKE $1 OR display_name ILIKE $1 OR email ILIKE $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(&pattern)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list accounts", e))?;

        Ok(PageResponse::new(
            users,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn create(&self, data: &CreateUserAccount) -> AppResult<UserAccount> {
        sqlx::query_as::<_, UserAccount>(
            "INSERT INTO user_accounts (id, username, email, password_hash, display_name, role) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(&data.display_name)
        .bind(data.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("user_accounts_username_key") =>
            {
                AppError::conflict(format!("Username '{}' already exists", data.username))
                    .with_key("user.username_taken")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create account", e),
        })
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: UserStatus,
    ) -> AppResult<Option<UserAccount>> {
        sqlx::query_as::<_, UserAccount>(
            "UPDATE user_accounts SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update account status", e)
        })
    }

    async fn touch_last_login(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE user_accounts SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update last login", e)
            })?;
        Ok(())
    }
}

//! Account administration: creation, listing, status changes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use stowage_auth::password::{PasswordHasher, PasswordValidator};
use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::types::pagination::{PageRequest, PageResponse};
use stowage_database::traits::UserAccountStore;
use stowage_entity::user::{CreateUserAccount, UserAccount, UserRole, UserStatus};

use crate::context::RequestContext;

/// Request to create a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    /// Username (unique, case-insensitive).
    pub username: String,
    /// Email (optional).
    pub email: Option<String>,
    /// Initial password.
    pub password: String,
    /// Display name.
    pub display_name: Option<String>,
    /// Role assignment.
    pub role: UserRole,
}

/// Handles account administration and profile lookups.
#[derive(Debug, Clone)]
pub struct UserService {
    users: Arc<dyn UserAccountStore>,
    hasher: Arc<PasswordHasher>,
    validator: Arc<PasswordValidator>,
}

/// Usernames are 3-64 characters of ASCII letters, digits, `.`, `_`, `-`.
fn validate_username(username: &str) -> AppResult<()> {
    let valid_len = (3..=64).contains(&username.len());
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid_len && valid_chars {
        return Ok(());
    }
    Err(AppError::validation(
        "Username must be 3-64 characters of letters, digits, '.', '_' or '-'",
    )
    .with_key("validation.username")
    .with_details(serde_json::json!({ "username": ["invalid format"] })))
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        users: Arc<dyn UserAccountStore>,
        hasher: Arc<PasswordHasher>,
        validator: Arc<PasswordValidator>,
    ) -> Self {
        Self {
            users,
            hasher,
            validator,
        }
    }

    /// Creates an account after enforcing the password policy.
    pub async fn create_user(&self, req: CreateUserRequest) -> AppResult<UserAccount> {
        let username = req.username.trim().to_string();
        validate_username(&username)?;

        let email = req
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        let mut inputs = vec![username.as_str()];
        if let Some(email) = &email {
            inputs.push(email.as_str());
        }
        self.validator.validate(&req.password, &inputs)?;

        let password_hash = self.hasher.hash_password(&req.password)?;
        let user = self
            .users
            .create(&CreateUserAccount {
                username,
                email,
                password_hash,
                display_name: req.display_name.filter(|d| !d.trim().is_empty()),
                role: req.role,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, role = %user.role, "Account created");
        Ok(user)
    }

    /// Lists accounts with pagination and optional search.
    pub async fn list_users(
        &self,
        search: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<UserAccount>> {
        self.users.list(search, &page.normalized()).await
    }

    /// Gets an account by ID.
    pub async fn get_user(&self, id: Uuid) -> AppResult<UserAccount> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found").with_key("user.not_found"))
    }

    /// Gets an account by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<UserAccount> {
        self.users
            .find_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::not_found("User not found").with_key("user.not_found"))
    }

    /// The caller's own account.
    pub async fn get_profile(&self, ctx: &RequestContext) -> AppResult<UserAccount> {
        self.get_user(ctx.user_id).await
    }

    /// Enables or disables an account.
    pub async fn set_status(&self, id: Uuid, status: UserStatus) -> AppResult<UserAccount> {
        let user = self
            .users
            .update_status(id, status)
            .await?
            .ok_or_else(|| AppError::not_found("User not found").with_key("user.not_found"))?;
        info!(user_id = %id, status = %status, "Account status changed");
        Ok(user)
    }

    /// Enables or disables an account on behalf of an admin, who may not
    /// disable themselves.
    pub async fn set_status_as(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        status: UserStatus,
    ) -> AppResult<UserAccount> {
        if ctx.user_id == id && status == UserStatus::Disabled {
            return Err(AppError::unprocessable("You cannot disable your own account")
                .with_key("user.cannot_disable_self"));
        }
        self.set_status(id, status).await
    }
}

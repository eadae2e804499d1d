//! Admin group management.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::types::pagination::{PageRequest, PageResponse};
use stowage_database::traits::{AdminGroupStore, UserAccountStore};
use stowage_entity::admin_group::{
    AdminGroup, AdminGroupMember, CreateAdminGroup, UpdateAdminGroup,
};

use crate::context::RequestContext;

/// Longest accepted group name.
const MAX_NAME_LEN: usize = 100;

/// Request to create a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAdminGroupRequest {
    /// Unique group name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Permission strings granted to members.
    pub permissions: Vec<String>,
}

/// Handles admin group CRUD and membership.
#[derive(Debug, Clone)]
pub struct AdminGroupService {
    groups: Arc<dyn AdminGroupStore>,
    users: Arc<dyn UserAccountStore>,
}

fn group_not_found() -> AppError {
    AppError::not_found("Admin group not found").with_key("admin_group.not_found")
}

fn normalize_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(
            AppError::validation(format!("Group name must be 1-{MAX_NAME_LEN} characters"))
                .with_key("validation.admin_group_name")
                .with_details(serde_json::json!({ "name": ["invalid length"] })),
        );
    }
    Ok(name.to_string())
}

/// Trim, drop blanks and deduplicate, keeping a stable sorted order.
fn normalize_permissions(permissions: Vec<String>) -> Vec<String> {
    permissions
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl AdminGroupService {
    /// Creates a new admin group service.
    pub fn new(groups: Arc<dyn AdminGroupStore>, users: Arc<dyn UserAccountStore>) -> Self {
        Self { groups, users }
    }

    /// Creates a group owned by the calling admin.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        req: CreateAdminGroupRequest,
    ) -> AppResult<AdminGroup> {
        let group = self
            .groups
            .create(&CreateAdminGroup {
                name: normalize_name(&req.name)?,
                description: req.description.filter(|d| !d.trim().is_empty()),
                permissions: normalize_permissions(req.permissions),
                created_by: Some(ctx.user_id),
            })
            .await?;
        info!(group_id = %group.id, name = %group.name, actor = %ctx.user_id, "Admin group created");
        Ok(group)
    }

    /// Gets a group by ID.
    pub async fn get(&self, id: Uuid) -> AppResult<AdminGroup> {
        self.groups.find_by_id(id).await?.ok_or_else(group_not_found)
    }

    /// Lists groups with pagination and optional name search.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AdminGroup>> {
        self.groups.list(search, &page.normalized()).await
    }

    /// Applies a partial update.
    pub async fn update(&self, id: Uuid, mut update: UpdateAdminGroup) -> AppResult<AdminGroup> {
        if let Some(name) = &update.name {
            update.name = Some(normalize_name(name)?);
        }
        update.permissions = update.permissions.map(normalize_permissions);

        let group = self
            .groups
            .update(id, &update)
            .await?
            .ok_or_else(group_not_found)?;
        info!(group_id = %id, "Admin group updated");
        Ok(group)
    }

    /// Deletes a group and its memberships.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.groups.delete(id).await? {
            return Err(group_not_found());
        }
        info!(group_id = %id, "Admin group deleted");
        Ok(())
    }

    /// Adds an account to a group.
    pub async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> AppResult<AdminGroupMember> {
        self.get(group_id).await?;
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AppError::not_found("User not found").with_key("user.not_found"));
        }
        let member = self.groups.add_member(group_id, user_id).await?;
        info!(group_id = %group_id, user_id = %user_id, "Member added to admin group");
        Ok(member)
    }

    /// Removes an account from a group.
    pub async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.get(group_id).await?;
        if !self.groups.remove_member(group_id, user_id).await? {
            return Err(AppError::not_found("Account is not a member of this group")
                .with_key("admin_group.member_not_found"));
        }
        info!(group_id = %group_id, user_id = %user_id, "Member removed from admin group");
        Ok(())
    }

    /// Lists a group's members.
    pub async fn list_members(&self, group_id: Uuid) -> AppResult<Vec<AdminGroupMember>> {
        self.get(group_id).await?;
        self.groups.list_members(group_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::error::ErrorKind;
    use stowage_database::Stores;
    use stowage_entity::user::{CreateUserAccount, UserRole};

    fn admin_ctx() -> RequestContext {
        RequestContext::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            UserRole::Admin,
            "root".to_string(),
            "ip".to_string(),
            None,
        )
    }

    fn request(name: &str) -> CreateAdminGroupRequest {
        CreateAdminGroupRequest {
            name: name.to_string(),
            description: None,
            permissions: vec![" files.read ".into(), "files.read".into(), "".into(), "locks.view".into()],
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_input() {
        let stores = Stores::memory();
        let svc = AdminGroupService::new(stores.admin_groups, stores.users);
        let ctx = admin_ctx();

        let group = svc.create(&ctx, request("  Operators ")).await.unwrap();
        assert_eq!(group.name, "Operators");
        assert_eq!(group.permissions, vec!["files.read", "locks.view"]);
        assert_eq!(group.created_by, Some(ctx.user_id));
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let stores = Stores::memory();
        let svc = AdminGroupService::new(stores.admin_groups, stores.users);
        let err = svc.create(&admin_ctx(), request("   ")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_membership_lifecycle() {
        let stores = Stores::memory();
        let user = stores
            .users
            .create(&CreateUserAccount {
                username: "member".to_string(),
                email: None,
                password_hash: "x".to_string(),
                display_name: None,
                role: UserRole::Member,
            })
            .await
            .unwrap();
        let svc = AdminGroupService::new(stores.admin_groups, stores.users);
        let group = svc.create(&admin_ctx(), request("Auditors")).await.unwrap();

        svc.add_member(group.id, user.id).await.unwrap();
        let dup = svc.add_member(group.id, user.id).await.unwrap_err();
        assert_eq!(dup.kind, ErrorKind::Conflict);
        assert_eq!(svc.list_members(group.id).await.unwrap().len(), 1);

        svc.remove_member(group.id, user.id).await.unwrap();
        let missing = svc.remove_member(group.id, user.id).await.unwrap_err();
        assert_eq!(missing.kind, ErrorKind::NotFound);

        let unknown_user = svc.add_member(group.id, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(unknown_user.message_key.as_deref(), Some("user.not_found"));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let stores = Stores::memory();
        let svc = AdminGroupService::new(stores.admin_groups, stores.users);
        let group = svc.create(&admin_ctx(), request("Ops")).await.unwrap();

        let updated = svc
            .update(
                group.id,
                UpdateAdminGroup {
                    name: Some("Operations".to_string()),
                    ..UpdateAdminGroup::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Operations");

        svc.delete(group.id).await.unwrap();
        assert_eq!(svc.get(group.id).await.unwrap_err().kind, ErrorKind::NotFound);
        assert_eq!(svc.delete(group.id).await.unwrap_err().kind, ErrorKind::NotFound);
    }
}

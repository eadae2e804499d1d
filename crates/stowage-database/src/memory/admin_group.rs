//! In-memory admin group store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::types::pagination::{PageRequest, PageResponse};
use stowage_entity::admin_group::{
    AdminGroup, AdminGroupMember, CreateAdminGroup, UpdateAdminGroup,
};

use super::{matches_search, paginate};
use crate::traits::AdminGroupStore;

#[derive(Debug, Default)]
struct State {
    groups: HashMap<Uuid, AdminGroup>,
    members: Vec<AdminGroupMember>,
}

/// Groups and memberships behind one lock.
#[derive(Debug, Default)]
pub struct MemoryAdminGroupStore {
    state: RwLock<State>,
}

impl MemoryAdminGroupStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn name_taken(name: &str) -> AppError {
    AppError::conflict(format!("Group '{name}' already exists")).with_key("admin_group.name_taken")
}

#[async_trait]
impl AdminGroupStore for MemoryAdminGroupStore {
    async fn create(&self, data: &CreateAdminGroup) -> AppResult<AdminGroup> {
        let mut state = self.state.write().await;
        if state.groups.values().any(|g| g.name == data.name) {
            return Err(name_taken(&data.name));
        }
        let now = Utc::now();
        let group = AdminGroup {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            description: data.description.clone(),
            permissions: data.permissions.clone(),
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };
        state.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AdminGroup>> {
        Ok(self.state.read().await.groups.get(&id).cloned())
    }

    async fn list(
        &self,
        search: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AdminGroup>> {
        let state = self.state.read().await;
        let mut groups: Vec<AdminGroup> = state
            .groups
            .values()
            .filter(|g| matches_search(search, &[Some(g.name.as_str())]))
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(paginate(groups, page))
    }

    async fn update(&self, id: Uuid, data: &UpdateAdminGroup) -> AppResult<Option<AdminGroup>> {
        let mut state = self.state.write().await;
        if let Some(name) = &data.name {
            if state.groups.values().any(|g| g.id != id && &g.name == name) {
                return Err(name_taken(name));
            }
        }
        Ok(state.groups.get_mut(&id).map(|group| {
            if let Some(name) = &data.name {
                group.name = name.clone();
            }
            if let Some(description) = &data.description {
                group.description = Some(description.clone());
            }
            if let Some(permissions) = &data.permissions {
                group.permissions = permissions.clone();
            }
            group.updated_at = Utc::now();
            group.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let removed = state.groups.remove(&id).is_some();
        state.members.retain(|m| m.group_id != id);
        Ok(removed)
    }

    async fn add_member(
        &self,
        group_id: Uuid,
        user_account_id: Uuid,
    ) -> AppResult<AdminGroupMember> {
        let mut state = self.state.write().await;
        if !state.groups.contains_key(&group_id) {
            return Err(AppError::not_found(format!("Group {group_id} not found")));
        }
        if state
            .members
            .iter()
            .any(|m| m.group_id == group_id && m.user_account_id == user_account_id)
        {
            return Err(AppError::conflict("Account is already a member of this group")
                .with_key("admin_group.already_member"));
        }
        let member = AdminGroupMember {
            group_id,
            user_account_id,
            added_at: Utc::now(),
        };
        state.members.push(member.clone());
        Ok(member)
    }

    async fn remove_member(&self, group_id: Uuid, user_account_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let before = state.members.len();
        state
            .members
            .retain(|m| !(m.group_id == group_id && m.user_account_id == user_account_id));
        Ok(state.members.len() < before)
    }

    async fn list_members(&self, group_id: Uuid) -> AppResult<Vec<AdminGroupMember>> {
        let state = self.state.read().await;
        Ok(state
            .members
            .iter()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect())
    }
}

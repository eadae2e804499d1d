//! Admin group repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_core::types::pagination::{PageRequest, PageResponse};
use stowage_entity::admin_group::{
    AdminGroup, AdminGroupMember, CreateAdminGroup, UpdateAdminGroup,
};

use super::like_pattern;
use crate::traits::AdminGroupStore;

/// Repository for admin groups and their memberships.
#[derive(Debug, Clone)]
pub struct AdminGroupRepository {
    pool: PgPool,
}

impl AdminGroupRepository {
    /// Create a new admin group repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_name_conflict(e: sqlx::Error, name: &str, context: &'static str) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.constraint() == Some("admin_groups_name_key") => {
            AppError::conflict(format!("Group '{name}' already exists"))
                .with_key("admin_group.name_taken")
        }
        _ => AppError::with_source(ErrorKind::Database, context, e),
    }
}

#[async_trait]
impl AdminGroupStore for AdminGroupRepository {
    async fn create(&self, data: &CreateAdminGroup) -> AppResult<AdminGroup> {
        sqlx::query_as::<_, AdminGroup>(
            "INSERT INTO admin_groups (id, name, description, permissions, created_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.permissions)
        .bind(data.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_name_conflict(e, &data.name, "Failed to create group"))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AdminGroup>> {
        sqlx::query_as::<_, AdminGroup>("SELECT * FROM admin_groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find group", e))
    }

    async fn list(
        &self,
        search: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AdminGroup>> {
        let pattern = like_pattern(search);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM admin_groups WHERE $1::text IS NULL OR name ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count groups", e))?;

        let groups = sqlx::query_as::<_, AdminGroup>(
            "SELECT * FROM admin_groups WHERE $1::text IS NULL OR name ILIKE $1 \
             ORDER BY name ASC LIMIT $2 OFFSET $3",
        )
        .bind(&pattern)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list groups", e))?;

        Ok(PageResponse::new(
            groups,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn update(&self, id: Uuid, data: &UpdateAdminGroup) -> AppResult<Option<AdminGroup>> {
        sqlx::query_as::<_, AdminGroup>(
            "UPDATE admin_groups SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                permissions = COALESCE($4::text[], permissions), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.permissions)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_name_conflict(e, data.name.as_deref().unwrap_or_default(), "Failed to update group")
        })
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        sqlx::query("DELETE FROM admin_groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected() == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete group", e))
    }

    async fn add_member(
        &self,
        group_id: Uuid,
        user_account_id: Uuid,
    ) -> AppResult<AdminGroupMember> {
        sqlx::query_as::<_, AdminGroupMember>(
            "INSERT INTO admin_group_members (group_id, user_account_id) \
             VALUES ($1, $2) RETURNING *",
        )
        .bind(group_id)
        .bind(user_account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("admin_group_members_pkey") =>
            {
                AppError::conflict("Account is already a member of this group")
                    .with_key("admin_group.already_member")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to add group member", e),
        })
    }

    async fn remove_member(&self, group_id: Uuid, user_account_id: Uuid) -> AppResult<bool> {
        sqlx::query(
            "DELETE FROM admin_group_members WHERE group_id = $1 AND user_account_id = $2",
        )
        .bind(group_id)
        .bind(user_account_id)
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected() == 1)
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to remove group member", e))
    }

    async fn list_members(&self, group_id: Uuid) -> AppResult<Vec<AdminGroupMember>> {
        sqlx::query_as::<_, AdminGroupMember>(
            "SELECT * FROM admin_group_members WHERE group_id = $1 ORDER BY added_at ASC",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list group members", e))
    }
}

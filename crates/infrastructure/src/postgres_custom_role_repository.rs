use std::collections::BTreeSet;

use async_trait::async_trait;
use atelier_application::CustomRoleRepository;
use atelier_core::{AppError, AppResult, TenantId};
use atelier_domain::{CustomRole, CustomRoleId, SystemRoleId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::postgres_columns::{map_write_error, store_error};

/// PostgreSQL-backed repository for tenant custom roles.
#[derive(Clone)]
pub struct PostgresCustomRoleRepository {
    pool: PgPool,
}

impl PostgresCustomRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CustomRoleRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    description: String,
    system_role_ids: Vec<String>,
}

impl CustomRoleRow {
    fn into_custom_role(self) -> AppResult<CustomRole> {
        let system_role_ids = self
            .system_role_ids
            .into_iter()
            .map(SystemRoleId::new)
            .collect::<AppResult<BTreeSet<_>>>()
            .map_err(|error| {
                AppError::Internal(format!("invalid stored custom role grants: {error}"))
            })?;

        CustomRole::new(
            CustomRoleId::from_uuid(self.id),
            TenantId::from_uuid(self.tenant_id),
            self.name,
            self.description,
            system_role_ids,
        )
        .map_err(|error| AppError::Internal(format!("invalid stored custom role: {error}")))
    }
}

fn into_custom_roles(rows: Vec<CustomRoleRow>) -> AppResult<Vec<CustomRole>> {
    rows.into_iter().map(CustomRoleRow::into_custom_role).collect()
}

#[async_trait]
impl CustomRoleRepository for PostgresCustomRoleRepository {
    async fn find_custom_role(
        &self,
        tenant_id: TenantId,
        custom_role_id: CustomRoleId,
    ) -> AppResult<Option<CustomRole>> {
        sqlx::query_as::<_, CustomRoleRow>(
            r#"
            SELECT id, tenant_id, name, description, system_role_ids
            FROM access_custom_roles
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(custom_role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error("failed to find custom role", error))?
        .map(CustomRoleRow::into_custom_role)
        .transpose()
    }

    async fn find_custom_roles(
        &self,
        tenant_id: TenantId,
        custom_role_ids: &BTreeSet<CustomRoleId>,
    ) -> AppResult<Vec<CustomRole>> {
        if custom_role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = custom_role_ids.iter().map(CustomRoleId::as_uuid).collect();
        let rows = sqlx::query_as::<_, CustomRoleRow>(
            r#"
            SELECT id, tenant_id, name, description, system_role_ids
            FROM access_custom_roles
            WHERE tenant_id = $1 AND id = ANY($2)
            ORDER BY lower(name), id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("failed to find custom roles", error))?;

        into_custom_roles(rows)
    }

    async fn list_custom_roles(&self, tenant_id: TenantId) -> AppResult<Vec<CustomRole>> {
        let rows = sqlx::query_as::<_, CustomRoleRow>(
            r#"
            SELECT id, tenant_id, name, description, system_role_ids
            FROM access_custom_roles
            WHERE tenant_id = $1
            ORDER BY lower(name), id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("failed to list custom roles", error))?;

        into_custom_roles(rows)
    }

    async fn save_custom_role(&self, custom_role: CustomRole) -> AppResult<()> {
        let system_role_ids: Vec<String> = custom_role
            .system_role_ids()
            .iter()
            .map(|system_role_id| system_role_id.as_str().to_owned())
            .collect();

        let saved = sqlx::query(
            r#"
            INSERT INTO access_custom_roles (id, tenant_id, name, description, system_role_ids)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                system_role_ids = EXCLUDED.system_role_ids
            WHERE access_custom_roles.tenant_id = EXCLUDED.tenant_id
            "#,
        )
        .bind(custom_role.id().as_uuid())
        .bind(custom_role.tenant_id().as_uuid())
        .bind(custom_role.name().as_str())
        .bind(custom_role.description())
        .bind(system_role_ids)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            map_write_error(
                error,
                &format!("failed to save custom role '{}'", custom_role.name()),
            )
        })?;

        if saved.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "custom role '{}' belongs to another tenant",
                custom_role.id()
            )));
        }

        Ok(())
    }

    async fn delete_custom_role(
        &self,
        tenant_id: TenantId,
        custom_role_id: CustomRoleId,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM access_custom_roles
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(custom_role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| store_error("failed to delete custom role", error))?;

        Ok(())
    }
}

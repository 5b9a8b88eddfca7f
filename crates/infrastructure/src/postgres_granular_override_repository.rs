use std::collections::BTreeMap;

use async_trait::async_trait;
use atelier_application::GranularOverrideRepository;
use atelier_core::{AppError, AppResult, TenantId};
use atelier_domain::{Action, GranularOverride, JobRole, Resource};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::postgres_columns::{parse_column, store_error};

/// PostgreSQL-backed repository for the tenant granular override table.
#[derive(Clone)]
pub struct PostgresGranularOverrideRepository {
    pool: PgPool,
}

impl PostgresGranularOverrideRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GranularOverrideRow {
    tenant_id: Uuid,
    job_role: String,
    resource: String,
    actions: Json<BTreeMap<Action, bool>>,
}

impl GranularOverrideRow {
    fn into_override(self) -> AppResult<GranularOverride> {
        GranularOverride::new(
            TenantId::from_uuid(self.tenant_id),
            parse_column::<Resource>("override resource", self.resource.as_str())?,
            parse_column::<JobRole>("override job role", self.job_role.as_str())?,
            self.actions.0,
        )
        .map_err(|error| AppError::Internal(format!("invalid stored override: {error}")))
    }
}

#[async_trait]
impl GranularOverrideRepository for PostgresGranularOverrideRepository {
    async fn list_overrides(
        &self,
        tenant_id: TenantId,
        job_role: Option<JobRole>,
    ) -> AppResult<Vec<GranularOverride>> {
        let rows = sqlx::query_as::<_, GranularOverrideRow>(
            r#"
            SELECT tenant_id, job_role, resource, actions
            FROM access_granular_overrides
            WHERE tenant_id = $1
              AND ($2::TEXT IS NULL OR job_role = $2)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(job_role.map(|job_role| job_role.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("failed to list granular overrides", error))?;

        let mut overrides = rows
            .into_iter()
            .map(GranularOverrideRow::into_override)
            .collect::<AppResult<Vec<_>>>()?;
        // Catalog order, not the text order of the stored identifiers.
        overrides.sort_by_key(|granular_override| {
            (granular_override.job_role(), granular_override.resource())
        });

        Ok(overrides)
    }

    async fn save_override(&self, granular_override: GranularOverride) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO access_granular_overrides (tenant_id, job_role, resource, actions)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id, job_role, resource) DO UPDATE
            SET actions = EXCLUDED.actions, updated_at = now()
            "#,
        )
        .bind(granular_override.tenant_id().as_uuid())
        .bind(granular_override.job_role().as_str())
        .bind(granular_override.resource().to_string())
        .bind(Json(granular_override.actions()))
        .execute(&self.pool)
        .await
        .map_err(|error| store_error("failed to save granular override", error))?;

        Ok(())
    }

    async fn delete_override(
        &self,
        tenant_id: TenantId,
        resource: Resource,
        job_role: JobRole,
    ) -> AppResult<bool> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM access_granular_overrides
            WHERE tenant_id = $1 AND job_role = $2 AND resource = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(job_role.as_str())
        .bind(resource.to_string())
        .execute(&self.pool)
        .await
        .map_err(|error| store_error("failed to delete granular override", error))?;

        Ok(deleted.rows_affected() > 0)
    }
}

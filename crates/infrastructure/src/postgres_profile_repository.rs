use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use atelier_application::{ProfileRepository, ProfileWrite};
use atelier_core::{AppError, AppResult, TenantId};
use atelier_domain::{
    AccessLevel, ActionFlags, AuditAction, AuditEntry, CustomRoleId, JobRole, ModuleId,
    NavItemId, Profile, ProfileId, ProfileKind, ProfileParts, SystemRoleId, Tier,
};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::postgres_columns::{
    map_write_error, parse_column, signed_column, store_error, unsigned_column,
};

/// PostgreSQL-backed repository for permission profiles and their audit history.
#[derive(Clone)]
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn audit_entries_for(
        &self,
        profile_ids: Vec<Uuid>,
    ) -> AppResult<HashMap<Uuid, Vec<AuditEntry>>> {
        let rows = sqlx::query_as::<_, AuditEntryRow>(
            r#"
            SELECT
                profile_id,
                changed_by_user_id,
                changed_by_email,
                changed_at,
                action,
                field_changed,
                old_value,
                new_value,
                reason,
                affected_users_count
            FROM access_profile_audit_entries
            WHERE profile_id = ANY($1)
            ORDER BY profile_id, position
            "#,
        )
        .bind(profile_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("failed to load profile audit history", error))?;

        let mut grouped: HashMap<Uuid, Vec<AuditEntry>> = HashMap::new();
        for row in rows {
            let profile_id = row.profile_id;
            grouped
                .entry(profile_id)
                .or_default()
                .push(row.into_entry()?);
        }

        Ok(grouped)
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    kind: String,
    tier: String,
    job_roles: Vec<String>,
    system_role_ids: Vec<String>,
    custom_role_ids: Vec<Uuid>,
    module_access: Json<BTreeMap<ModuleId, AccessLevel>>,
    sidebar_access: Json<BTreeMap<NavItemId, ActionFlags>>,
    is_system: bool,
    cloned_from: Option<Uuid>,
    version: i64,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_profile(self, audit_log: Vec<AuditEntry>) -> AppResult<Profile> {
        let job_roles = self
            .job_roles
            .iter()
            .map(|value| parse_column::<JobRole>("job role", value))
            .collect::<AppResult<_>>()?;
        let system_role_ids = self
            .system_role_ids
            .into_iter()
            .map(|value| {
                SystemRoleId::new(value.clone()).map_err(|error| {
                    AppError::Internal(format!("invalid stored system role '{value}': {error}"))
                })
            })
            .collect::<AppResult<_>>()?;

        Profile::from_parts(ProfileParts {
            id: ProfileId::from_uuid(self.id),
            tenant_id: TenantId::from_uuid(self.tenant_id),
            name: self.name,
            kind: parse_column::<ProfileKind>("profile kind", self.kind.as_str())?,
            tier: parse_column::<Tier>("tier", self.tier.as_str())?,
            job_roles,
            system_role_ids,
            custom_role_ids: self
                .custom_role_ids
                .into_iter()
                .map(CustomRoleId::from_uuid)
                .collect(),
            module_access: self.module_access.0,
            sidebar_access: self.sidebar_access.0,
            is_system: self.is_system,
            cloned_from: self.cloned_from.map(ProfileId::from_uuid),
            audit_log,
            version: unsigned_column("profile version", self.version)?,
            updated_at: self.updated_at,
        })
        .map_err(|error| AppError::Internal(format!("invalid stored profile: {error}")))
    }
}

#[derive(Debug, FromRow)]
struct AuditEntryRow {
    profile_id: Uuid,
    changed_by_user_id: String,
    changed_by_email: Option<String>,
    changed_at: DateTime<Utc>,
    action: String,
    field_changed: String,
    old_value: String,
    new_value: String,
    reason: Option<String>,
    affected_users_count: i64,
}

impl AuditEntryRow {
    fn into_entry(self) -> AppResult<AuditEntry> {
        Ok(AuditEntry {
            changed_by_user_id: self.changed_by_user_id,
            changed_by_email: self.changed_by_email,
            timestamp: self.changed_at,
            action: parse_column::<AuditAction>("audit action", self.action.as_str())?,
            field_changed: self.field_changed,
            old_value: self.old_value,
            new_value: self.new_value,
            reason: self.reason,
            affected_users_count: unsigned_column(
                "affected users count",
                self.affected_users_count,
            )?,
        })
    }
}

const PROFILE_COLUMNS: &str = r#"
    id,
    tenant_id,
    name,
    kind,
    tier,
    job_roles,
    system_role_ids,
    custom_role_ids,
    module_access,
    sidebar_access,
    is_system,
    cloned_from,
    version,
    updated_at
"#;

fn job_role_values(profile: &Profile) -> Vec<String> {
    profile
        .job_roles()
        .iter()
        .map(|job_role| job_role.as_str().to_owned())
        .collect()
}

fn system_role_values(profile: &Profile) -> Vec<String> {
    profile
        .system_role_ids()
        .iter()
        .map(|system_role_id| system_role_id.as_str().to_owned())
        .collect()
}

fn custom_role_values(profile: &Profile) -> Vec<Uuid> {
    profile
        .custom_role_ids()
        .iter()
        .map(CustomRoleId::as_uuid)
        .collect()
}

/// Appends audit entries from `first_position` onward.
async fn insert_audit_entries(
    transaction: &mut Transaction<'_, Postgres>,
    profile: &Profile,
    first_position: usize,
) -> AppResult<()> {
    for (position, entry) in profile.audit_log().iter().enumerate().skip(first_position) {
        let position = i32::try_from(position).map_err(|error| {
            AppError::Internal(format!("audit history position overflow: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO access_profile_audit_entries (
                profile_id,
                position,
                changed_by_user_id,
                changed_by_email,
                changed_at,
                action,
                field_changed,
                old_value,
                new_value,
                reason,
                affected_users_count
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(profile.id().as_uuid())
        .bind(position)
        .bind(entry.changed_by_user_id.as_str())
        .bind(entry.changed_by_email.as_deref())
        .bind(entry.timestamp)
        .bind(entry.action.as_str())
        .bind(entry.field_changed.as_str())
        .bind(entry.old_value.as_str())
        .bind(entry.new_value.as_str())
        .bind(entry.reason.as_deref())
        .bind(signed_column(
            "affected users count",
            entry.affected_users_count,
        )?)
        .execute(&mut **transaction)
        .await
        .map_err(|error| store_error("failed to append profile audit entry", error))?;
    }

    Ok(())
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find_profile(
        &self,
        tenant_id: TenantId,
        profile_id: ProfileId,
    ) -> AppResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM access_profiles
            WHERE tenant_id = $1 AND id = $2
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(profile_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error("failed to find profile", error))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut audit = self.audit_entries_for(vec![row.id]).await?;
        let audit_log = audit.remove(&row.id).unwrap_or_default();
        row.into_profile(audit_log).map(Some)
    }

    async fn list_profiles(&self, tenant_id: TenantId) -> AppResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM access_profiles
            WHERE tenant_id = $1
            ORDER BY lower(name), id
            "#
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("failed to list profiles", error))?;

        let mut audit = self
            .audit_entries_for(rows.iter().map(|row| row.id).collect())
            .await?;

        rows.into_iter()
            .map(|row| {
                let audit_log = audit.remove(&row.id).unwrap_or_default();
                row.into_profile(audit_log)
            })
            .collect()
    }

    async fn insert_profile(&self, profile: Profile) -> AppResult<Profile> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| store_error("failed to begin transaction", error))?;

        sqlx::query(
            r#"
            INSERT INTO access_profiles (
                id,
                tenant_id,
                name,
                kind,
                tier,
                job_roles,
                system_role_ids,
                custom_role_ids,
                module_access,
                sidebar_access,
                is_system,
                cloned_from,
                version,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(profile.id().as_uuid())
        .bind(profile.tenant_id().as_uuid())
        .bind(profile.name().as_str())
        .bind(profile.kind().as_str())
        .bind(profile.tier().as_str())
        .bind(job_role_values(&profile))
        .bind(system_role_values(&profile))
        .bind(custom_role_values(&profile))
        .bind(Json(profile.module_access()))
        .bind(Json(profile.sidebar_access()))
        .bind(profile.is_system())
        .bind(profile.cloned_from().map(|profile_id| profile_id.as_uuid()))
        .bind(signed_column("profile version", profile.version())?)
        .bind(profile.updated_at())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            map_write_error(error, &format!("failed to create profile '{}'", profile.name()))
        })?;

        insert_audit_entries(&mut transaction, &profile, 0).await?;

        transaction
            .commit()
            .await
            .map_err(|error| store_error("failed to commit transaction", error))?;

        Ok(profile)
    }

    async fn update_profile(&self, mut profile: Profile) -> AppResult<ProfileWrite> {
        let written_at = Utc::now();
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| store_error("failed to begin transaction", error))?;

        let updated = sqlx::query(
            r#"
            UPDATE access_profiles
            SET
                name = $3,
                kind = $4,
                tier = $5,
                job_roles = $6,
                system_role_ids = $7,
                custom_role_ids = $8,
                module_access = $9,
                sidebar_access = $10,
                is_system = $11,
                cloned_from = $12,
                version = version + 1,
                updated_at = $13
            WHERE tenant_id = $1 AND id = $2 AND version = $14
            "#,
        )
        .bind(profile.tenant_id().as_uuid())
        .bind(profile.id().as_uuid())
        .bind(profile.name().as_str())
        .bind(profile.kind().as_str())
        .bind(profile.tier().as_str())
        .bind(job_role_values(&profile))
        .bind(system_role_values(&profile))
        .bind(custom_role_values(&profile))
        .bind(Json(profile.module_access()))
        .bind(Json(profile.sidebar_access()))
        .bind(profile.is_system())
        .bind(profile.cloned_from().map(|profile_id| profile_id.as_uuid()))
        .bind(written_at)
        .bind(signed_column("profile version", profile.version())?)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            map_write_error(error, &format!("failed to update profile '{}'", profile.name()))
        })?;

        if updated.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM access_profiles WHERE tenant_id = $1 AND id = $2
                )
                "#,
            )
            .bind(profile.tenant_id().as_uuid())
            .bind(profile.id().as_uuid())
            .fetch_one(&mut *transaction)
            .await
            .map_err(|error| store_error("failed to check profile existence", error))?;

            if !exists {
                return Err(AppError::NotFound(format!(
                    "profile '{}' does not exist for tenant '{}'",
                    profile.id(),
                    profile.tenant_id()
                )));
            }

            return Ok(ProfileWrite::Stale);
        }

        let stored_entries = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM access_profile_audit_entries WHERE profile_id = $1
            "#,
        )
        .bind(profile.id().as_uuid())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| store_error("failed to count profile audit entries", error))?;
        let stored_entries = usize::try_from(stored_entries).map_err(|error| {
            AppError::Internal(format!("invalid audit entry count {stored_entries}: {error}"))
        })?;

        insert_audit_entries(&mut transaction, &profile, stored_entries).await?;

        transaction
            .commit()
            .await
            .map_err(|error| store_error("failed to commit transaction", error))?;

        profile.advance_version(written_at);
        Ok(ProfileWrite::Written(profile))
    }

    async fn delete_profile(&self, tenant_id: TenantId, profile_id: ProfileId) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM access_profiles
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(profile_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            map_write_error(error, &format!("failed to delete profile '{profile_id}'"))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests;

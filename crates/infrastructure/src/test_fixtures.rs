use std::collections::{BTreeMap, BTreeSet};

use atelier_core::TenantId;
use atelier_domain::{
    AccessLevel, AuditAction, AuditEntry, CustomRole, CustomRoleId, EmailAddress, JobRole, Member,
    ModuleId, Profile, ProfileId, ProfileKind, ProfileParts, SystemRoleId, Tier,
};
use chrono::Utc;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connects to `DATABASE_URL` and applies migrations; `None` skips the test.
pub async fn postgres_test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres access tests: {error}");
    }

    Some(pool)
}

pub fn roles(values: &[&str]) -> BTreeSet<SystemRoleId> {
    values
        .iter()
        .map(|value| SystemRoleId::new(*value).unwrap_or_else(|_| unreachable!()))
        .collect()
}

pub fn profile(tenant_id: TenantId, name: &str) -> Profile {
    Profile::from_parts(ProfileParts {
        id: ProfileId::new(),
        tenant_id,
        name: name.to_owned(),
        kind: ProfileKind::Internal,
        tier: Tier::Custom,
        job_roles: BTreeSet::from([JobRole::Technician]),
        system_role_ids: roles(&["inventory.count"]),
        custom_role_ids: BTreeSet::new(),
        module_access: BTreeMap::from([(ModuleId::ServiceOrders, AccessLevel::Full)]),
        sidebar_access: BTreeMap::new(),
        is_system: false,
        cloned_from: None,
        audit_log: Vec::new(),
        version: 0,
        updated_at: Utc::now(),
    })
    .unwrap_or_else(|_| unreachable!())
}

pub fn audit_entry(field: &str, new_value: &str) -> AuditEntry {
    AuditEntry {
        changed_by_user_id: "admin".to_owned(),
        changed_by_email: Some("admin@oficina.com.br".to_owned()),
        timestamp: Utc::now(),
        action: AuditAction::ProfileUpdated,
        field_changed: field.to_owned(),
        old_value: "[]".to_owned(),
        new_value: new_value.to_owned(),
        reason: Some("ajuste de rotina".to_owned()),
        affected_users_count: 1,
    }
}

pub fn custom_role(tenant_id: TenantId, name: &str, grants: &[&str]) -> CustomRole {
    CustomRole::new(CustomRoleId::new(), tenant_id, name, "", roles(grants))
        .unwrap_or_else(|_| unreachable!())
}

pub fn member(
    tenant_id: TenantId,
    user_id: &str,
    job_role: JobRole,
    profile_id: Option<ProfileId>,
) -> Member {
    let email = EmailAddress::new(format!("{user_id}@oficina.com.br")).ok();
    Member::new(user_id, tenant_id, user_id, email, job_role, profile_id)
        .unwrap_or_else(|_| unreachable!())
}

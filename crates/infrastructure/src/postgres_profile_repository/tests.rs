use std::collections::BTreeMap;

use atelier_application::{ProfileRepository, ProfileWrite};
use atelier_core::{AppError, TenantId};
use atelier_domain::{AccessLevel, ActionFlags, ModuleId, NavItemId};

use super::PostgresProfileRepository;
use crate::test_fixtures::{audit_entry, postgres_test_pool, profile, roles};

#[tokio::test]
async fn inserted_profile_round_trips_permission_maps() {
    let Some(pool) = postgres_test_pool().await else {
        return;
    };

    let repository = PostgresProfileRepository::new(pool);
    let tenant_id = TenantId::new();
    let mut stored = profile(tenant_id, "Mecanicos");
    stored.set_sidebar_access(BTreeMap::from([(
        NavItemId::Quotes,
        ActionFlags {
            view: true,
            export: true,
            ..ActionFlags::default()
        },
    )]));

    let inserted = repository.insert_profile(stored.clone()).await;
    assert!(inserted.is_ok());

    let found = repository
        .find_profile(tenant_id, stored.id())
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    assert_eq!(found.module_access(), stored.module_access());
    assert_eq!(found.sidebar_access(), stored.sidebar_access());
    assert_eq!(found.system_role_ids(), &roles(&["inventory.count"]));
    assert_eq!(found.version(), 0);

    let other_tenant = repository.find_profile(TenantId::new(), stored.id()).await;
    assert!(matches!(other_tenant, Ok(None)));
}

#[tokio::test]
async fn duplicate_names_conflict_within_a_tenant() {
    let Some(pool) = postgres_test_pool().await else {
        return;
    };

    let repository = PostgresProfileRepository::new(pool);
    let tenant_id = TenantId::new();
    assert!(
        repository
            .insert_profile(profile(tenant_id, "Recepcao"))
            .await
            .is_ok()
    );

    let duplicate = repository
        .insert_profile(profile(tenant_id, "RECEPCAO"))
        .await;

    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn update_appends_audit_entries_with_the_field_change() {
    let Some(pool) = postgres_test_pool().await else {
        return;
    };

    let repository = PostgresProfileRepository::new(pool);
    let tenant_id = TenantId::new();
    let stored = repository
        .insert_profile(profile(tenant_id, "Almoxarifado"))
        .await
        .unwrap_or_else(|_| unreachable!());

    let mut first = stored;
    first.set_module_access(BTreeMap::from([(ModuleId::Inventory, AccessLevel::Full)]));
    first.record_audit(audit_entry("module_access", "{\"inventory\":\"full\"}"));
    let Ok(ProfileWrite::Written(first)) = repository.update_profile(first).await else {
        unreachable!()
    };

    let mut second = first;
    second.record_audit(audit_entry("system_role_ids", "[]"));
    let Ok(ProfileWrite::Written(second)) = repository.update_profile(second).await else {
        unreachable!()
    };
    assert_eq!(second.version(), 2);

    let reloaded = repository
        .find_profile(tenant_id, second.id())
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    assert_eq!(reloaded.version(), 2);
    assert_eq!(
        reloaded.module_access().get(&ModuleId::Inventory),
        Some(&AccessLevel::Full)
    );
    let fields: Vec<&str> = reloaded
        .audit_log()
        .iter()
        .map(|entry| entry.field_changed.as_str())
        .collect();
    assert_eq!(fields, vec!["module_access", "system_role_ids"]);
}

#[tokio::test]
async fn stale_write_changes_nothing() {
    let Some(pool) = postgres_test_pool().await else {
        return;
    };

    let repository = PostgresProfileRepository::new(pool);
    let tenant_id = TenantId::new();
    let stored = repository
        .insert_profile(profile(tenant_id, "Oficina"))
        .await
        .unwrap_or_else(|_| unreachable!());

    let winner = repository.update_profile(stored.clone()).await;
    assert!(matches!(winner, Ok(ProfileWrite::Written(_))));

    let mut loser = stored.clone();
    loser.record_audit(audit_entry("tier", "\"viewer\""));
    let result = repository.update_profile(loser).await;
    assert!(matches!(result, Ok(ProfileWrite::Stale)));

    let reloaded = repository
        .find_profile(tenant_id, stored.id())
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    assert_eq!(reloaded.version(), 1);
    assert!(reloaded.audit_log().is_empty());
}

#[tokio::test]
async fn missing_profile_update_is_not_found_and_delete_is_silent() {
    let Some(pool) = postgres_test_pool().await else {
        return;
    };

    let repository = PostgresProfileRepository::new(pool);
    let tenant_id = TenantId::new();
    let ghost = profile(tenant_id, "Fantasma");

    let updated = repository.update_profile(ghost.clone()).await;
    assert!(matches!(updated, Err(AppError::NotFound(_))));

    assert!(repository.delete_profile(tenant_id, ghost.id()).await.is_ok());
}

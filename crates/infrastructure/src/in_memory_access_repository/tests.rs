use std::collections::{BTreeMap, BTreeSet};

use atelier_application::{
    CustomRoleRepository, GranularOverrideRepository, MemberRepository, ProfileRepository,
    ProfileWrite,
};
use atelier_core::{AppError, TenantId};
use atelier_domain::{Action, GranularOverride, JobRole, ModuleId, NavItemId, Resource};

use super::InMemoryAccessRepository;
use crate::test_fixtures::{audit_entry, custom_role, member, profile};

#[tokio::test]
async fn profiles_do_not_leak_across_tenants() {
    let repository = InMemoryAccessRepository::new();
    let left_tenant = TenantId::new();
    let right_tenant = TenantId::new();
    let stored = profile(left_tenant, "Mecanicos");

    let inserted = repository.insert_profile(stored.clone()).await;
    assert!(inserted.is_ok());

    let found = repository.find_profile(right_tenant, stored.id()).await;
    assert!(matches!(found, Ok(None)));
    let listed = repository.list_profiles(right_tenant).await;
    assert!(listed.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn profiles_list_by_name_ignoring_case() {
    let repository = InMemoryAccessRepository::new();
    let tenant_id = TenantId::new();
    for name in ["recepcao", "Almoxarifado", "Financeiro"] {
        let inserted = repository.insert_profile(profile(tenant_id, name)).await;
        assert!(inserted.is_ok());
    }

    let names: Vec<String> = repository
        .list_profiles(tenant_id)
        .await
        .unwrap_or_default()
        .iter()
        .map(|profile| profile.name().as_str().to_owned())
        .collect();

    assert_eq!(names, vec!["Almoxarifado", "Financeiro", "recepcao"]);
}

#[tokio::test]
async fn duplicate_profile_names_conflict() {
    let repository = InMemoryAccessRepository::new();
    let tenant_id = TenantId::new();
    let inserted = repository
        .insert_profile(profile(tenant_id, "Mecanicos"))
        .await;
    assert!(inserted.is_ok());

    let duplicate = repository
        .insert_profile(profile(tenant_id, "MECANICOS"))
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let other_tenant = repository
        .insert_profile(profile(TenantId::new(), "Mecanicos"))
        .await;
    assert!(other_tenant.is_ok());
}

#[tokio::test]
async fn update_advances_version_and_keeps_audit_history() {
    let repository = InMemoryAccessRepository::new();
    let tenant_id = TenantId::new();
    let stored = repository
        .insert_profile(profile(tenant_id, "Mecanicos"))
        .await
        .unwrap_or_else(|_| unreachable!());

    let mut edited = stored.clone();
    edited.set_system_role_ids(BTreeSet::new());
    edited.record_audit(audit_entry("system_role_ids", "[]"));

    let written = repository.update_profile(edited).await;
    let Ok(ProfileWrite::Written(written)) = written else {
        unreachable!()
    };
    assert_eq!(written.version(), 1);
    assert!(written.system_role_ids().is_empty());

    let reloaded = repository
        .find_profile(tenant_id, stored.id())
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    assert_eq!(reloaded.version(), 1);
    assert_eq!(reloaded.audit_log().len(), 1);
}

#[tokio::test]
async fn write_from_an_outdated_read_is_stale() {
    let repository = InMemoryAccessRepository::new();
    let tenant_id = TenantId::new();
    let stored = repository
        .insert_profile(profile(tenant_id, "Mecanicos"))
        .await
        .unwrap_or_else(|_| unreachable!());

    let first = repository.update_profile(stored.clone()).await;
    assert!(matches!(first, Ok(ProfileWrite::Written(_))));

    let mut outdated = stored;
    outdated.record_audit(audit_entry("tier", "\"viewer\""));
    let second = repository.update_profile(outdated).await;
    assert!(matches!(second, Ok(ProfileWrite::Stale)));

    let reloaded = repository
        .list_profiles(tenant_id)
        .await
        .unwrap_or_default();
    assert!(reloaded[0].audit_log().is_empty());
}

#[tokio::test]
async fn updating_a_missing_profile_is_not_found() {
    let repository = InMemoryAccessRepository::new();

    let result = repository
        .update_profile(profile(TenantId::new(), "Fantasma"))
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn custom_roles_are_found_by_id_set_and_skip_unknown_ids() {
    let repository = InMemoryAccessRepository::new();
    let tenant_id = TenantId::new();
    let auditing = custom_role(tenant_id, "Auditoria", &["reports.export"]);
    let purchasing = custom_role(tenant_id, "Compras", &["purchasing.approve"]);
    let foreign = custom_role(TenantId::new(), "Compras", &["purchasing.approve"]);
    for role in [auditing.clone(), purchasing.clone(), foreign.clone()] {
        assert!(repository.save_custom_role(role).await.is_ok());
    }

    let requested = BTreeSet::from([auditing.id(), foreign.id()]);
    let found = repository
        .find_custom_roles(tenant_id, &requested)
        .await
        .unwrap_or_default();
    assert_eq!(found, vec![auditing.clone()]);

    let listed = repository
        .list_custom_roles(tenant_id)
        .await
        .unwrap_or_default();
    assert_eq!(listed, vec![auditing, purchasing]);
}

#[tokio::test]
async fn custom_role_names_are_unique_per_tenant() {
    let repository = InMemoryAccessRepository::new();
    let tenant_id = TenantId::new();
    let original = custom_role(tenant_id, "Auditoria", &["reports.export"]);
    assert!(repository.save_custom_role(original.clone()).await.is_ok());

    let mut renamed_grants = original;
    renamed_grants.set_system_role_ids(BTreeSet::new());
    assert!(repository.save_custom_role(renamed_grants).await.is_ok());

    let clash = repository
        .save_custom_role(custom_role(tenant_id, "auditoria", &[]))
        .await;
    assert!(matches!(clash, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn overrides_replace_by_key_and_filter_by_job_role() {
    let repository = InMemoryAccessRepository::new();
    let tenant_id = TenantId::new();
    let quotes = Resource::NavItem(NavItemId::Quotes);
    let granular = |job_role: JobRole, resource: Resource, action: Action, allowed: bool| {
        GranularOverride::new(
            tenant_id,
            resource,
            job_role,
            BTreeMap::from([(action, allowed)]),
        )
        .unwrap_or_else(|_| unreachable!())
    };

    for entry in [
        granular(JobRole::Technician, quotes, Action::View, true),
        granular(JobRole::Technician, quotes, Action::Delete, false),
        granular(
            JobRole::Financial,
            Resource::Module(ModuleId::Financial),
            Action::Approve,
            true,
        ),
    ] {
        assert!(repository.save_override(entry).await.is_ok());
    }

    let technician = repository
        .list_overrides(tenant_id, Some(JobRole::Technician))
        .await
        .unwrap_or_default();
    assert_eq!(technician.len(), 1);
    assert_eq!(
        technician[0].actions(),
        &BTreeMap::from([(Action::Delete, false)])
    );

    let all = repository
        .list_overrides(tenant_id, None)
        .await
        .unwrap_or_default();
    assert_eq!(all.len(), 2);

    let removed = repository
        .delete_override(tenant_id, quotes, JobRole::Technician)
        .await;
    assert!(matches!(removed, Ok(true)));
    let removed_again = repository
        .delete_override(tenant_id, quotes, JobRole::Technician)
        .await;
    assert!(matches!(removed_again, Ok(false)));
}

#[tokio::test]
async fn members_are_counted_per_profile() {
    let repository = InMemoryAccessRepository::new();
    let tenant_id = TenantId::new();
    let stored = profile(tenant_id, "Mecanicos");
    for (user_id, profile_id) in [
        ("ana", Some(stored.id())),
        ("bruno", Some(stored.id())),
        ("carla", None),
    ] {
        let saved = repository
            .save_member(member(tenant_id, user_id, JobRole::Technician, profile_id))
            .await;
        assert!(saved.is_ok());
    }

    let count = repository
        .count_members_with_profile(tenant_id, stored.id())
        .await;
    assert!(matches!(count, Ok(2)));

    let found = repository.find_member(tenant_id, "carla").await;
    assert!(matches!(found, Ok(Some(found)) if found.profile_id().is_none()));
    let elsewhere = repository.find_member(TenantId::new(), "carla").await;
    assert!(matches!(elsewhere, Ok(None)));
}

#[tokio::test]
async fn only_the_first_member_of_a_workshop_is_inserted_conditionally() {
    let repository = InMemoryAccessRepository::new();
    let tenant_id = TenantId::new();

    let first = repository
        .insert_first_member(member(tenant_id, "dono", JobRole::Director, None))
        .await;
    let second = repository
        .insert_first_member(member(tenant_id, "intruso", JobRole::Technician, None))
        .await;
    let other_workshop = repository
        .insert_first_member(member(TenantId::new(), "intruso", JobRole::Technician, None))
        .await;

    assert!(matches!(first, Ok(true)));
    assert!(matches!(second, Ok(false)));
    assert!(matches!(other_workshop, Ok(true)));
    assert!(matches!(
        repository.find_member(tenant_id, "intruso").await,
        Ok(None)
    ));
}

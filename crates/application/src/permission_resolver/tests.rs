use std::collections::BTreeMap;

use atelier_core::TenantId;
use atelier_domain::{
    AccessLevel, Action, ActionFlags, GranularOverride, JobRole, ModuleId, NavItemId, Resource,
    Tier,
};
use proptest::prelude::*;
use proptest::sample::select;

use super::{ResolutionInput, resolve_permissions};
use crate::test_support::{build_profile, custom_role, profile_parts, roles, viewer_profile};

fn granular(
    tenant_id: TenantId,
    resource: Resource,
    job_role: JobRole,
    actions: &[(Action, bool)],
) -> GranularOverride {
    GranularOverride::new(
        tenant_id,
        resource,
        job_role,
        actions.iter().copied().collect(),
    )
    .unwrap_or_else(|_| unreachable!())
}

fn override_strategy(tenant_id: TenantId) -> impl Strategy<Value = GranularOverride> {
    (
        prop_oneof![
            select(ModuleId::all()).prop_map(Resource::Module),
            select(NavItemId::all()).prop_map(Resource::NavItem),
        ],
        select(JobRole::all()),
        proptest::collection::btree_map(select(Action::all()), any::<bool>(), 1..4),
    )
        .prop_map(move |(resource, job_role, actions)| {
            GranularOverride::new(tenant_id, resource, job_role, actions)
                .unwrap_or_else(|_| unreachable!())
        })
}

#[test]
fn member_without_profile_resolves_from_job_role_defaults() {
    let permissions = resolve_permissions(ResolutionInput {
        job_role: JobRole::Technician,
        profile: None,
        custom_roles: &[],
        overrides: &[],
    });

    assert_eq!(permissions.tier, Tier::Custom);
    assert_eq!(
        permissions.module_level(ModuleId::ServiceOrders),
        AccessLevel::Full
    );
    assert_eq!(
        permissions.module_level(ModuleId::Financial),
        AccessLevel::Blocked
    );
    assert!(permissions.allows(Resource::NavItem(NavItemId::Quotes), Action::Edit));
    assert!(!permissions.allows(Resource::NavItem(NavItemId::CashFlow), Action::View));
    assert!(permissions.system_roles.is_empty());
}

#[test]
fn profile_levels_replace_defaults_module_by_module() {
    let tenant_id = TenantId::new();
    let profile = viewer_profile(
        tenant_id,
        "Caixa",
        &[(ModuleId::Financial, AccessLevel::Full)],
    );

    let permissions = resolve_permissions(ResolutionInput {
        job_role: JobRole::Technician,
        profile: Some(&profile),
        custom_roles: &[],
        overrides: &[],
    });

    assert_eq!(permissions.tier, Tier::Viewer);
    assert_eq!(
        permissions.module_level(ModuleId::Financial),
        AccessLevel::Full
    );
    // Stored profiles carry every module, so unlisted ones come back blocked.
    assert_eq!(
        permissions.module_level(ModuleId::ServiceOrders),
        AccessLevel::Blocked
    );
    assert!(permissions.allows(Resource::NavItem(NavItemId::CashFlow), Action::Approve));
}

#[test]
fn read_false_override_denies_module_and_its_sidebar_items() {
    let tenant_id = TenantId::new();
    let profile = viewer_profile(
        tenant_id,
        "Balcao",
        &[(ModuleId::Customers, AccessLevel::View)],
    );
    let overrides = [granular(
        tenant_id,
        Resource::Module(ModuleId::Customers),
        JobRole::ServiceAdvisor,
        &[(Action::View, false)],
    )];

    let permissions = resolve_permissions(ResolutionInput {
        job_role: JobRole::ServiceAdvisor,
        profile: Some(&profile),
        custom_roles: &[],
        overrides: &overrides,
    });

    assert!(!permissions.allows(Resource::Module(ModuleId::Customers), Action::View));
    assert!(!permissions.allows(Resource::NavItem(NavItemId::Customers), Action::View));
    assert_eq!(
        permissions.module_level(ModuleId::Customers),
        AccessLevel::Blocked
    );
}

#[test]
fn override_can_extend_actions_without_reaching_full() {
    let tenant_id = TenantId::new();
    let profile = viewer_profile(
        tenant_id,
        "Relatorios",
        &[(ModuleId::Reports, AccessLevel::View)],
    );
    let overrides = [granular(
        tenant_id,
        Resource::Module(ModuleId::Reports),
        JobRole::Marketing,
        &[(Action::Export, true)],
    )];

    let permissions = resolve_permissions(ResolutionInput {
        job_role: JobRole::Marketing,
        profile: Some(&profile),
        custom_roles: &[],
        overrides: &overrides,
    });

    assert!(permissions.allows(Resource::Module(ModuleId::Reports), Action::Export));
    assert!(!permissions.allows(Resource::Module(ModuleId::Reports), Action::Delete));
    assert_eq!(
        permissions.module_level(ModuleId::Reports),
        AccessLevel::View
    );
}

#[test]
fn navigation_override_beats_module_override() {
    let tenant_id = TenantId::new();
    let overrides = [
        granular(
            tenant_id,
            Resource::NavItem(NavItemId::CashFlow),
            JobRole::Financial,
            &[(Action::View, true)],
        ),
        granular(
            tenant_id,
            Resource::Module(ModuleId::Financial),
            JobRole::Financial,
            &[(Action::View, false)],
        ),
    ];

    let permissions = resolve_permissions(ResolutionInput {
        job_role: JobRole::Financial,
        profile: None,
        custom_roles: &[],
        overrides: &overrides,
    });

    assert!(permissions.allows(Resource::NavItem(NavItemId::CashFlow), Action::View));
    assert!(!permissions.allows(Resource::NavItem(NavItemId::AccountsPayable), Action::View));
    assert!(!permissions.allows(Resource::Module(ModuleId::Financial), Action::View));
}

#[test]
fn overrides_for_other_job_roles_are_ignored() {
    let tenant_id = TenantId::new();
    let overrides = [granular(
        tenant_id,
        Resource::Module(ModuleId::ServiceOrders),
        JobRole::ServiceAdvisor,
        &[(Action::View, false)],
    )];

    let permissions = resolve_permissions(ResolutionInput {
        job_role: JobRole::Technician,
        profile: None,
        custom_roles: &[],
        overrides: &overrides,
    });

    assert!(permissions.allows(Resource::Module(ModuleId::ServiceOrders), Action::View));
}

#[test]
fn conflicting_duplicate_overrides_resolve_to_deny() {
    let tenant_id = TenantId::new();
    let allow = granular(
        tenant_id,
        Resource::NavItem(NavItemId::Quotes),
        JobRole::Technician,
        &[(Action::Delete, true)],
    );
    let deny = granular(
        tenant_id,
        Resource::NavItem(NavItemId::Quotes),
        JobRole::Technician,
        &[(Action::Delete, false)],
    );

    for overrides in [[allow.clone(), deny.clone()], [deny, allow]] {
        let permissions = resolve_permissions(ResolutionInput {
            job_role: JobRole::Technician,
            profile: None,
            custom_roles: &[],
            overrides: &overrides,
        });
        assert!(!permissions.allows(Resource::NavItem(NavItemId::Quotes), Action::Delete));
    }
}

#[test]
fn explicit_sidebar_entry_beats_module_derivation() {
    let tenant_id = TenantId::new();
    let mut parts = profile_parts(tenant_id, "Oficina", Tier::Custom);
    parts.module_access = BTreeMap::from([(ModuleId::ServiceOrders, AccessLevel::Full)]);
    parts.sidebar_access = BTreeMap::from([(NavItemId::Quotes, ActionFlags::none())]);
    let profile = build_profile(parts);

    let permissions = resolve_permissions(ResolutionInput {
        job_role: JobRole::Technician,
        profile: Some(&profile),
        custom_roles: &[],
        overrides: &[],
    });

    assert!(!permissions.allows(Resource::NavItem(NavItemId::Quotes), Action::View));
    assert!(permissions.allows(Resource::NavItem(NavItemId::ServiceOrders), Action::Delete));
}

#[test]
fn only_referenced_custom_roles_contribute_system_roles() {
    let tenant_id = TenantId::new();
    let referenced = custom_role(tenant_id, "Auditoria", &["reports.export", "finance.read"]);
    let unrelated = custom_role(tenant_id, "Compras", &["purchasing.approve"]);

    let mut parts = profile_parts(tenant_id, "Auditor", Tier::Custom);
    parts.system_role_ids = roles(&["finance.read", "dashboard.read"]);
    parts.custom_role_ids = [referenced.id()].into_iter().collect();
    let profile = build_profile(parts);

    let permissions = resolve_permissions(ResolutionInput {
        job_role: JobRole::Financial,
        profile: Some(&profile),
        custom_roles: &[referenced, unrelated],
        overrides: &[],
    });

    assert_eq!(
        permissions.system_roles,
        roles(&["dashboard.read", "finance.read", "reports.export"])
    );
    assert!(!permissions.has_system_role("purchasing.approve"));
}

#[test]
fn admin_profile_overrides_a_restrictive_job_role() {
    let tenant_id = TenantId::new();
    let profile = build_profile(profile_parts(tenant_id, "Dono", Tier::Admin));

    let permissions = resolve_permissions(ResolutionInput {
        job_role: JobRole::Other,
        profile: Some(&profile),
        custom_roles: &[],
        overrides: &[],
    });

    assert!(
        ModuleId::all()
            .iter()
            .all(|module| permissions.module_level(*module) == AccessLevel::Full)
    );
}

proptest! {
    #[test]
    fn admin_tier_is_absolute(
        overrides in proptest::collection::vec(override_strategy(TenantId::new()), 0..12),
        job_role in select(JobRole::all()),
    ) {
        let tenant_id = TenantId::new();
        let profile = build_profile(profile_parts(tenant_id, "Administrador", Tier::Admin));

        let permissions = resolve_permissions(ResolutionInput {
            job_role,
            profile: Some(&profile),
            custom_roles: &[],
            overrides: &overrides,
        });

        for module in ModuleId::all() {
            prop_assert_eq!(permissions.module_level(*module), AccessLevel::Full);
            prop_assert_eq!(permissions.module_actions.get(module), Some(&ActionFlags::all()));
        }
        for item in NavItemId::all() {
            prop_assert_eq!(permissions.sidebar_access.get(item), Some(&ActionFlags::all()));
        }
    }

    #[test]
    fn resolution_ignores_override_order(
        overrides in proptest::collection::vec(override_strategy(TenantId::new()), 0..12),
        job_role in select(JobRole::all()),
    ) {
        let forward = resolve_permissions(ResolutionInput {
            job_role,
            profile: None,
            custom_roles: &[],
            overrides: &overrides,
        });

        let mut reversed = overrides.clone();
        reversed.reverse();
        let backward = resolve_permissions(ResolutionInput {
            job_role,
            profile: None,
            custom_roles: &[],
            overrides: &reversed,
        });

        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn resolution_covers_the_whole_catalog(
        overrides in proptest::collection::vec(override_strategy(TenantId::new()), 0..12),
        job_role in select(JobRole::all()),
    ) {
        let permissions = resolve_permissions(ResolutionInput {
            job_role,
            profile: None,
            custom_roles: &[],
            overrides: &overrides,
        });

        prop_assert_eq!(permissions.module_access.len(), ModuleId::all().len());
        prop_assert_eq!(permissions.module_actions.len(), ModuleId::all().len());
        prop_assert_eq!(permissions.sidebar_access.len(), NavItemId::all().len());
    }
}

//! Pure permission resolution.
//!
//! Resolution walks [`ResolutionLayer::ORDER`] and every layer writes over
//! explicit key sets ([`ModuleId::all`], [`NavItemId::all`]), so the result
//! never depends on map insertion order. The matrix preview calls the same
//! function, which keeps "what admins see" equal to "what is enforced".

use std::collections::{BTreeMap, BTreeSet};

use atelier_domain::{
    AccessLevel, Action, ActionFlags, CustomRole, EffectivePermissionSet, GranularOverride,
    JobRole, JobRoleDefaults, ModuleId, NavItemId, Profile, Resource, SystemRoleId, Tier,
};

/// Everything the resolver needs for one member.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionInput<'a> {
    /// Member job role; selects defaults and overrides.
    pub job_role: JobRole,
    /// Attached profile, if the member has one.
    pub profile: Option<&'a Profile>,
    /// Custom roles loaded for the profile's references.
    pub custom_roles: &'a [CustomRole],
    /// Tenant overrides; entries for other job roles are ignored.
    pub overrides: &'a [GranularOverride],
}

/// Resolution layers, applied in [`ResolutionLayer::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionLayer {
    /// Job-role baseline.
    JobRoleDefaults,
    /// Profile maps override defaults key by key.
    Profile,
    /// Custom role grants are unioned into system roles.
    CustomRoles,
    /// Overrides replace individual action flags.
    GranularOverrides,
    /// Admin tier grants everything.
    AdminTier,
}

impl ResolutionLayer {
    /// Application order; later layers win, the admin tier is absolute.
    pub const ORDER: [Self; 5] = [
        Self::JobRoleDefaults,
        Self::Profile,
        Self::CustomRoles,
        Self::GranularOverrides,
        Self::AdminTier,
    ];
}

struct Resolution {
    tier: Tier,
    module_access: BTreeMap<ModuleId, AccessLevel>,
    module_actions: BTreeMap<ModuleId, ActionFlags>,
    sidebar_access: BTreeMap<NavItemId, ActionFlags>,
    system_roles: BTreeSet<SystemRoleId>,
}

/// Computes the effective permission set for one member.
#[must_use]
pub fn resolve_permissions(input: ResolutionInput<'_>) -> EffectivePermissionSet {
    let mut resolution = Resolution {
        tier: Tier::Viewer,
        module_access: BTreeMap::new(),
        module_actions: BTreeMap::new(),
        sidebar_access: BTreeMap::new(),
        system_roles: BTreeSet::new(),
    };

    for layer in ResolutionLayer::ORDER {
        match layer {
            ResolutionLayer::JobRoleDefaults => apply_defaults(&mut resolution, input.job_role),
            ResolutionLayer::Profile => {
                if let Some(profile) = input.profile {
                    apply_profile(&mut resolution, profile);
                }
            }
            ResolutionLayer::CustomRoles => {
                if let Some(profile) = input.profile {
                    apply_custom_roles(&mut resolution, profile, input.custom_roles);
                }
            }
            ResolutionLayer::GranularOverrides => {
                apply_overrides(&mut resolution, input.job_role, input.overrides);
            }
            ResolutionLayer::AdminTier => apply_admin_tier(&mut resolution),
        }
    }

    EffectivePermissionSet {
        tier: resolution.tier,
        module_access: resolution.module_access,
        module_actions: resolution.module_actions,
        sidebar_access: resolution.sidebar_access,
        system_roles: resolution.system_roles,
    }
}

fn apply_defaults(resolution: &mut Resolution, job_role: JobRole) {
    let defaults = JobRoleDefaults::for_job_role(job_role);
    resolution.tier = defaults.tier();

    for module in ModuleId::all() {
        let level = defaults.access(*module);
        resolution.module_access.insert(*module, level);
        resolution
            .module_actions
            .insert(*module, level.implied_actions());
    }

    resolution.sidebar_access = defaults.sidebar_access();
}

fn apply_profile(resolution: &mut Resolution, profile: &Profile) {
    resolution.tier = profile.tier();

    for module in ModuleId::all() {
        if let Some(level) = profile.module_access().get(module) {
            resolution.module_access.insert(*module, *level);
            resolution
                .module_actions
                .insert(*module, level.implied_actions());
        }
    }

    // Items without an explicit entry follow the merged level of their module.
    for item in NavItemId::all() {
        let flags = profile
            .sidebar_access()
            .get(item)
            .copied()
            .unwrap_or_else(|| module_level(resolution, item.module()).implied_actions());
        resolution.sidebar_access.insert(*item, flags);
    }

    resolution
        .system_roles
        .extend(profile.system_role_ids().iter().cloned());
}

fn apply_custom_roles(resolution: &mut Resolution, profile: &Profile, custom_roles: &[CustomRole]) {
    for custom_role in custom_roles {
        if profile.custom_role_ids().contains(&custom_role.id()) {
            resolution
                .system_roles
                .extend(custom_role.system_role_ids().iter().cloned());
        }
    }
}

fn apply_overrides(resolution: &mut Resolution, job_role: JobRole, overrides: &[GranularOverride]) {
    let merged = merge_overrides(job_role, overrides);

    // Module keys first so a navigation-item key, being more specific, wins.
    for (resource, actions) in &merged {
        if let Resource::Module(module) = resource {
            let mut flags = module_actions(resolution, *module);
            for (action, allowed) in actions {
                flags.set(*action, *allowed);
            }
            resolution.module_actions.insert(*module, flags);
            resolution
                .module_access
                .insert(*module, level_for_actions(flags));

            for item in NavItemId::all().iter().filter(|item| item.module() == *module) {
                let mut item_flags = sidebar_flags(resolution, *item);
                for (action, allowed) in actions {
                    item_flags.set(*action, *allowed);
                }
                resolution.sidebar_access.insert(*item, item_flags);
            }
        }
    }

    for (resource, actions) in &merged {
        if let Resource::NavItem(item) = resource {
            let mut flags = sidebar_flags(resolution, *item);
            for (action, allowed) in actions {
                flags.set(*action, *allowed);
            }
            resolution.sidebar_access.insert(*item, flags);
        }
    }
}

fn apply_admin_tier(resolution: &mut Resolution) {
    if resolution.tier != Tier::Admin {
        return;
    }

    for module in ModuleId::all() {
        resolution.module_access.insert(*module, AccessLevel::Full);
        resolution.module_actions.insert(*module, ActionFlags::all());
    }
    for item in NavItemId::all() {
        resolution.sidebar_access.insert(*item, ActionFlags::all());
    }
}

/// Collapses the job role's overrides into one action map per resource.
///
/// Duplicate keys should not exist; if they do, a `false` beats a `true` so
/// the outcome does not depend on input order.
fn merge_overrides(
    job_role: JobRole,
    overrides: &[GranularOverride],
) -> BTreeMap<Resource, BTreeMap<Action, bool>> {
    let mut merged: BTreeMap<Resource, BTreeMap<Action, bool>> = BTreeMap::new();

    for granular_override in overrides
        .iter()
        .filter(|granular_override| granular_override.job_role() == job_role)
    {
        let actions = merged.entry(granular_override.resource()).or_default();
        for (action, allowed) in granular_override.actions() {
            actions
                .entry(*action)
                .and_modify(|current| *current = *current && *allowed)
                .or_insert(*allowed);
        }
    }

    merged
}

fn module_level(resolution: &Resolution, module: ModuleId) -> AccessLevel {
    resolution
        .module_access
        .get(&module)
        .copied()
        .unwrap_or(AccessLevel::Blocked)
}

fn module_actions(resolution: &Resolution, module: ModuleId) -> ActionFlags {
    resolution
        .module_actions
        .get(&module)
        .copied()
        .unwrap_or_default()
}

fn sidebar_flags(resolution: &Resolution, item: NavItemId) -> ActionFlags {
    resolution
        .sidebar_access
        .get(&item)
        .copied()
        .unwrap_or_default()
}

/// Module level implied by overridden flags: no `view` blocks the module,
/// every action makes it full, anything else is view.
fn level_for_actions(flags: ActionFlags) -> AccessLevel {
    if !flags.view {
        AccessLevel::Blocked
    } else if flags == ActionFlags::all() {
        AccessLevel::Full
    } else {
        AccessLevel::View
    }
}

#[cfg(test)]
mod tests;

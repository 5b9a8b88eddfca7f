use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{AccessLevel, Action, ActionFlags, ModuleId, NavItemId, Resource, SystemRoleId, Tier};

/// Final authorization decision for one member at one point in time.
///
/// Never persisted. Every module and navigation item has an entry, so a
/// lookup miss only happens for keys outside the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissionSet {
    /// Tier the set was resolved under.
    pub tier: Tier,
    /// Access level per module.
    pub module_access: BTreeMap<ModuleId, AccessLevel>,
    /// Action flags per module after overrides.
    pub module_actions: BTreeMap<ModuleId, ActionFlags>,
    /// Action flags per sidebar item.
    pub sidebar_access: BTreeMap<NavItemId, ActionFlags>,
    /// Union of direct and custom-role system roles.
    pub system_roles: BTreeSet<SystemRoleId>,
}

impl EffectivePermissionSet {
    /// A set that denies everything.
    #[must_use]
    pub fn deny_all() -> Self {
        Self {
            tier: Tier::Viewer,
            module_access: ModuleId::all()
                .iter()
                .map(|module| (*module, AccessLevel::Blocked))
                .collect(),
            module_actions: ModuleId::all()
                .iter()
                .map(|module| (*module, ActionFlags::none()))
                .collect(),
            sidebar_access: NavItemId::all()
                .iter()
                .map(|item| (*item, ActionFlags::none()))
                .collect(),
            system_roles: BTreeSet::new(),
        }
    }

    /// Returns the access level for a module.
    #[must_use]
    pub fn module_level(&self, module: ModuleId) -> AccessLevel {
        self.module_access
            .get(&module)
            .copied()
            .unwrap_or(AccessLevel::Blocked)
    }

    /// Returns whether the action is allowed on the resource.
    #[must_use]
    pub fn allows(&self, resource: Resource, action: Action) -> bool {
        let flags = match resource {
            Resource::Module(module) => self.module_actions.get(&module),
            Resource::NavItem(item) => self.sidebar_access.get(&item),
        };

        flags.is_some_and(|flags| flags.get(action))
    }

    /// Returns whether the set carries a system role.
    #[must_use]
    pub fn has_system_role(&self, role: &str) -> bool {
        self.system_roles.iter().any(|held| held.as_str() == role)
    }
}

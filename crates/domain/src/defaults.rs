//! Baseline permissions per job role.
//!
//! Used to seed new profiles and to resolve members who have no profile
//! attached yet.

use std::collections::BTreeMap;

use crate::{AccessLevel, ActionFlags, JobRole, ModuleId, NavItemId, Tier};

use AccessLevel::{Full, View};
use ModuleId::{
    AccessControl, Customers, Dashboard, Financial, Inventory, Marketing, People, Purchasing,
    Reports, Schedule, ServiceOrders, Settings, Training, Vehicles,
};

const DIRECTOR: &[(ModuleId, AccessLevel)] = &[
    (Dashboard, Full),
    (Customers, Full),
    (Vehicles, Full),
    (ServiceOrders, Full),
    (Schedule, Full),
    (Inventory, Full),
    (Purchasing, Full),
    (Financial, Full),
    (Reports, Full),
    (Training, Full),
    (Marketing, Full),
    (People, Full),
    (Settings, Full),
    (AccessControl, Full),
];

const MANAGER: &[(ModuleId, AccessLevel)] = &[
    (Dashboard, Full),
    (Customers, Full),
    (Vehicles, Full),
    (ServiceOrders, Full),
    (Schedule, Full),
    (Inventory, Full),
    (Purchasing, Full),
    (Financial, View),
    (Reports, Full),
    (Training, Full),
    (Marketing, View),
    (People, View),
    (Settings, View),
];

const SERVICE_ADVISOR: &[(ModuleId, AccessLevel)] = &[
    (Dashboard, View),
    (Customers, Full),
    (Vehicles, Full),
    (ServiceOrders, Full),
    (Schedule, Full),
    (Inventory, View),
    (Reports, View),
    (Training, View),
];

const TECHNICIAN: &[(ModuleId, AccessLevel)] = &[
    (Dashboard, View),
    (Vehicles, View),
    (ServiceOrders, Full),
    (Schedule, View),
    (Inventory, View),
    (Training, View),
];

const FINANCIAL: &[(ModuleId, AccessLevel)] = &[
    (Dashboard, View),
    (Customers, View),
    (ServiceOrders, View),
    (Purchasing, Full),
    (Financial, Full),
    (Reports, Full),
    (Training, View),
];

const COMMERCIAL: &[(ModuleId, AccessLevel)] = &[
    (Dashboard, View),
    (Customers, Full),
    (Vehicles, View),
    (ServiceOrders, View),
    (Schedule, Full),
    (Reports, View),
    (Training, View),
    (Marketing, Full),
];

const MARKETING: &[(ModuleId, AccessLevel)] = &[
    (Dashboard, View),
    (Customers, View),
    (Reports, View),
    (Training, View),
    (Marketing, Full),
];

const HUMAN_RESOURCES: &[(ModuleId, AccessLevel)] = &[
    (Dashboard, View),
    (Reports, View),
    (Training, Full),
    (People, Full),
];

const OTHER: &[(ModuleId, AccessLevel)] = &[(Dashboard, View)];

/// Immutable baseline bundle for one job role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRoleDefaults {
    job_role: JobRole,
    tier: Tier,
    module_access: BTreeMap<ModuleId, AccessLevel>,
}

impl JobRoleDefaults {
    /// Returns the baseline bundle for a known job role.
    #[must_use]
    pub fn for_job_role(job_role: JobRole) -> Self {
        let (tier, grants) = match job_role {
            JobRole::Director => (Tier::Admin, DIRECTOR),
            JobRole::Manager => (Tier::Editor, MANAGER),
            JobRole::ServiceAdvisor => (Tier::Custom, SERVICE_ADVISOR),
            JobRole::Technician => (Tier::Custom, TECHNICIAN),
            JobRole::Financial => (Tier::Custom, FINANCIAL),
            JobRole::Commercial => (Tier::Custom, COMMERCIAL),
            JobRole::Marketing => (Tier::Custom, MARKETING),
            JobRole::HumanResources => (Tier::Custom, HUMAN_RESOURCES),
            JobRole::Other => (Tier::Viewer, OTHER),
        };

        let mut module_access = blocked_module_access();
        for (module, level) in grants {
            module_access.insert(*module, *level);
        }

        Self {
            job_role,
            tier,
            module_access,
        }
    }

    /// Returns the baseline bundle for any job-role string.
    ///
    /// Unrecognised values resolve to the `other` bundle.
    #[must_use]
    pub fn for_label(value: &str) -> Self {
        Self::for_job_role(JobRole::classify(value))
    }

    /// Returns the job role the bundle was built for.
    #[must_use]
    pub fn job_role(&self) -> JobRole {
        self.job_role
    }

    /// Returns the baseline tier.
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Returns module access for every module.
    #[must_use]
    pub fn module_access(&self) -> &BTreeMap<ModuleId, AccessLevel> {
        &self.module_access
    }

    /// Returns the baseline level for one module.
    #[must_use]
    pub fn access(&self, module: ModuleId) -> AccessLevel {
        self.module_access
            .get(&module)
            .copied()
            .unwrap_or(AccessLevel::Blocked)
    }

    /// Derives sidebar flags for every navigation item from its owning module.
    #[must_use]
    pub fn sidebar_access(&self) -> BTreeMap<NavItemId, ActionFlags> {
        NavItemId::all()
            .iter()
            .map(|item| (*item, self.access(item.module()).implied_actions()))
            .collect()
    }
}

/// Module access map with every module blocked.
#[must_use]
pub fn blocked_module_access() -> BTreeMap<ModuleId, AccessLevel> {
    ModuleId::all()
        .iter()
        .map(|module| (*module, AccessLevel::Blocked))
        .collect()
}

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use atelier_core::{AppError, AppResult, TenantId};
use serde::{Deserialize, Serialize};

use crate::{Action, JobRole, ModuleId, NavItemId};

/// Target of a granular override.
///
/// Transported as `module:<module_id>` or `nav:<nav_item_id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Resource {
    /// A whole module.
    Module(ModuleId),
    /// One sidebar item.
    NavItem(NavItemId),
}

impl Display for Resource {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Module(module) => write!(formatter, "module:{}", module.as_str()),
            Self::NavItem(item) => write!(formatter, "nav:{}", item.as_str()),
        }
    }
}

impl FromStr for Resource {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once(':') {
            Some(("module", module)) => Ok(Self::Module(ModuleId::from_str(module)?)),
            Some(("nav", item)) => Ok(Self::NavItem(NavItemId::from_str(item)?)),
            _ => Err(AppError::Validation(format!(
                "resource '{value}' must be 'module:<id>' or 'nav:<id>'"
            ))),
        }
    }
}

impl TryFrom<String> for Resource {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(value.as_str())
    }
}

impl From<Resource> for String {
    fn from(value: Resource) -> Self {
        value.to_string()
    }
}

/// Tenant-wide action exception for one resource and job role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GranularOverride {
    tenant_id: TenantId,
    resource: Resource,
    job_role: JobRole,
    actions: BTreeMap<Action, bool>,
}

impl GranularOverride {
    /// Creates an override; the action map must name at least one action.
    pub fn new(
        tenant_id: TenantId,
        resource: Resource,
        job_role: JobRole,
        actions: BTreeMap<Action, bool>,
    ) -> AppResult<Self> {
        if actions.is_empty() {
            return Err(AppError::Validation(format!(
                "override for '{resource}' and job role '{}' must set at least one action",
                job_role.as_str()
            )));
        }

        Ok(Self {
            tenant_id,
            resource,
            job_role,
            actions,
        })
    }

    /// Returns the owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the overridden resource.
    #[must_use]
    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// Returns the job role the override applies to.
    #[must_use]
    pub fn job_role(&self) -> JobRole {
        self.job_role
    }

    /// Returns the overridden actions.
    #[must_use]
    pub fn actions(&self) -> &BTreeMap<Action, bool> {
        &self.actions
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::str::FromStr;

    use atelier_core::TenantId;

    use super::{GranularOverride, Resource};
    use crate::{JobRole, ModuleId, NavItemId};

    #[test]
    fn resource_transport_requires_prefix() {
        assert!(matches!(
            Resource::from_str("module:reports"),
            Ok(Resource::Module(ModuleId::Reports))
        ));
        assert!(matches!(
            Resource::from_str("nav:cash_flow"),
            Ok(Resource::NavItem(NavItemId::CashFlow))
        ));
        assert!(Resource::from_str("reports").is_err());
        assert_eq!(
            Resource::NavItem(NavItemId::AuditLog).to_string(),
            "nav:audit_log"
        );
    }

    #[test]
    fn empty_action_map_is_rejected() {
        let result = GranularOverride::new(
            TenantId::new(),
            Resource::Module(ModuleId::Reports),
            JobRole::Technician,
            BTreeMap::new(),
        );
        assert!(result.is_err());
    }
}

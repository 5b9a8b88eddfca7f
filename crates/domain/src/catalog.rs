//! Closed catalogs of modules, navigation items, job roles, and tiers.
//!
//! Every permission map in the system is keyed by these enumerations, so a
//! misspelled module or sidebar key fails at parse time instead of silently
//! granting nothing.

use std::str::FromStr;

use atelier_core::AppError;
use serde::{Deserialize, Serialize};

/// Functional module of the workshop application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleId {
    /// Landing dashboard.
    Dashboard,
    /// Customer registry.
    Customers,
    /// Vehicle registry.
    Vehicles,
    /// Service orders and quotes.
    ServiceOrders,
    /// Appointment scheduling.
    Schedule,
    /// Parts and stock.
    Inventory,
    /// Suppliers and purchase orders.
    Purchasing,
    /// Receivables, payables, and cash flow.
    Financial,
    /// Management reports.
    Reports,
    /// Training content.
    Training,
    /// Campaigns and messaging automation.
    Marketing,
    /// Employees and HR records.
    People,
    /// Workshop settings.
    Settings,
    /// Users, permission profiles, and audit.
    AccessControl,
}

impl ModuleId {
    /// Returns a stable storage value for this module.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Customers => "customers",
            Self::Vehicles => "vehicles",
            Self::ServiceOrders => "service_orders",
            Self::Schedule => "schedule",
            Self::Inventory => "inventory",
            Self::Purchasing => "purchasing",
            Self::Financial => "financial",
            Self::Reports => "reports",
            Self::Training => "training",
            Self::Marketing => "marketing",
            Self::People => "people",
            Self::Settings => "settings",
            Self::AccessControl => "access_control",
        }
    }

    /// Returns all known modules in declaration order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ModuleId] = &[
            ModuleId::Dashboard,
            ModuleId::Customers,
            ModuleId::Vehicles,
            ModuleId::ServiceOrders,
            ModuleId::Schedule,
            ModuleId::Inventory,
            ModuleId::Purchasing,
            ModuleId::Financial,
            ModuleId::Reports,
            ModuleId::Training,
            ModuleId::Marketing,
            ModuleId::People,
            ModuleId::Settings,
            ModuleId::AccessControl,
        ];

        ALL
    }
}

impl FromStr for ModuleId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|module| module.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown module '{value}'")))
    }
}

/// Sidebar/navigation entry gated by per-action flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavItemId {
    /// Dashboard home.
    Dashboard,
    /// Customer list.
    Customers,
    /// Vehicle list.
    Vehicles,
    /// Service order board.
    ServiceOrders,
    /// Quotes awaiting approval.
    Quotes,
    /// Appointment calendar.
    Appointments,
    /// Stock items.
    InventoryItems,
    /// Supplier registry.
    Suppliers,
    /// Purchase orders.
    PurchaseOrders,
    /// Accounts receivable.
    AccountsReceivable,
    /// Accounts payable.
    AccountsPayable,
    /// Cash flow statement.
    CashFlow,
    /// Report center.
    Reports,
    /// Training courses.
    Courses,
    /// Marketing campaigns.
    Campaigns,
    /// Employee registry.
    Employees,
    /// Workshop settings page.
    WorkshopSettings,
    /// User management.
    Users,
    /// Permission profile editor.
    PermissionProfiles,
    /// Access-control audit trail.
    AuditLog,
}

impl NavItemId {
    /// Returns a stable storage value for this item.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Customers => "customers",
            Self::Vehicles => "vehicles",
            Self::ServiceOrders => "service_orders",
            Self::Quotes => "quotes",
            Self::Appointments => "appointments",
            Self::InventoryItems => "inventory_items",
            Self::Suppliers => "suppliers",
            Self::PurchaseOrders => "purchase_orders",
            Self::AccountsReceivable => "accounts_receivable",
            Self::AccountsPayable => "accounts_payable",
            Self::CashFlow => "cash_flow",
            Self::Reports => "reports",
            Self::Courses => "courses",
            Self::Campaigns => "campaigns",
            Self::Employees => "employees",
            Self::WorkshopSettings => "workshop_settings",
            Self::Users => "users",
            Self::PermissionProfiles => "permission_profiles",
            Self::AuditLog => "audit_log",
        }
    }

    /// Returns the module that owns this navigation item.
    #[must_use]
    pub fn module(&self) -> ModuleId {
        match self {
            Self::Dashboard => ModuleId::Dashboard,
            Self::Customers => ModuleId::Customers,
            Self::Vehicles => ModuleId::Vehicles,
            Self::ServiceOrders | Self::Quotes => ModuleId::ServiceOrders,
            Self::Appointments => ModuleId::Schedule,
            Self::InventoryItems => ModuleId::Inventory,
            Self::Suppliers | Self::PurchaseOrders => ModuleId::Purchasing,
            Self::AccountsReceivable | Self::AccountsPayable | Self::CashFlow => {
                ModuleId::Financial
            }
            Self::Reports => ModuleId::Reports,
            Self::Courses => ModuleId::Training,
            Self::Campaigns => ModuleId::Marketing,
            Self::Employees => ModuleId::People,
            Self::WorkshopSettings => ModuleId::Settings,
            Self::Users | Self::PermissionProfiles | Self::AuditLog => ModuleId::AccessControl,
        }
    }

    /// Returns all known navigation items in declaration order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[NavItemId] = &[
            NavItemId::Dashboard,
            NavItemId::Customers,
            NavItemId::Vehicles,
            NavItemId::ServiceOrders,
            NavItemId::Quotes,
            NavItemId::Appointments,
            NavItemId::InventoryItems,
            NavItemId::Suppliers,
            NavItemId::PurchaseOrders,
            NavItemId::AccountsReceivable,
            NavItemId::AccountsPayable,
            NavItemId::CashFlow,
            NavItemId::Reports,
            NavItemId::Courses,
            NavItemId::Campaigns,
            NavItemId::Employees,
            NavItemId::WorkshopSettings,
            NavItemId::Users,
            NavItemId::PermissionProfiles,
            NavItemId::AuditLog,
        ];

        ALL
    }
}

impl FromStr for NavItemId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|item| item.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown navigation item '{value}'")))
    }
}

/// Functional classification of a workshop member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobRole {
    /// Owner or director.
    Director,
    /// Workshop manager.
    Manager,
    /// Front-desk service advisor.
    ServiceAdvisor,
    /// Mechanic or technician.
    Technician,
    /// Finance staff.
    Financial,
    /// Sales staff.
    Commercial,
    /// Marketing staff.
    Marketing,
    /// Human resources.
    HumanResources,
    /// Anything not recognised.
    Other,
}

impl JobRole {
    /// Returns a stable storage value for this job role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Director => "director",
            Self::Manager => "manager",
            Self::ServiceAdvisor => "service_advisor",
            Self::Technician => "technician",
            Self::Financial => "financial",
            Self::Commercial => "commercial",
            Self::Marketing => "marketing",
            Self::HumanResources => "human_resources",
            Self::Other => "other",
        }
    }

    /// Returns all known job roles in declaration order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[JobRole] = &[
            JobRole::Director,
            JobRole::Manager,
            JobRole::ServiceAdvisor,
            JobRole::Technician,
            JobRole::Financial,
            JobRole::Commercial,
            JobRole::Marketing,
            JobRole::HumanResources,
            JobRole::Other,
        ];

        ALL
    }

    /// Maps any string onto a job role; unrecognised values become [`JobRole::Other`].
    #[must_use]
    pub fn classify(value: &str) -> Self {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "outros" => Self::Other,
            other => Self::from_str(other).unwrap_or(Self::Other),
        }
    }
}

impl FromStr for JobRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown job role '{value}'")))
    }
}

/// Coarse permission tier of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Unrestricted access; cannot be narrowed by overrides.
    Admin,
    /// Broad editing access.
    Editor,
    /// Hand-tuned permissions.
    Custom,
    /// Read-mostly access.
    Viewer,
}

impl Tier {
    /// Returns a stable storage value for this tier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Custom => "custom",
            Self::Viewer => "viewer",
        }
    }
}

impl FromStr for Tier {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            "custom" => Ok(Self::Custom),
            "viewer" => Ok(Self::Viewer),
            _ => Err(AppError::Validation(format!("unknown tier '{value}'"))),
        }
    }
}

/// Audience a profile is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    /// Workshop staff.
    Internal,
    /// Partners and outside collaborators.
    External,
    /// Platform-managed profile.
    System,
}

impl ProfileKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
            Self::System => "system",
        }
    }
}

impl FromStr for ProfileKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "internal" => Ok(Self::Internal),
            "external" => Ok(Self::External),
            "system" => Ok(Self::System),
            _ => Err(AppError::Validation(format!(
                "unknown profile kind '{value}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{JobRole, ModuleId, NavItemId};

    #[test]
    fn module_storage_values_roundtrip() {
        for module in ModuleId::all() {
            assert!(matches!(ModuleId::from_str(module.as_str()), Ok(parsed) if parsed == *module));
        }
    }

    #[test]
    fn every_nav_item_parses_back() {
        for item in NavItemId::all() {
            assert!(matches!(NavItemId::from_str(item.as_str()), Ok(parsed) if parsed == *item));
        }
        assert!(NavItemId::from_str("payroll").is_err());
    }

    #[test]
    fn classify_falls_back_to_other() {
        assert_eq!(JobRole::classify(" Technician "), JobRole::Technician);
        assert_eq!(JobRole::classify("outros"), JobRole::Other);
        assert_eq!(JobRole::classify("lavador"), JobRole::Other);
        assert_eq!(JobRole::classify(""), JobRole::Other);
    }
}

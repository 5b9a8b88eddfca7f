use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use atelier_core::{AppError, AppResult};
use atelier_domain::{
    AccessLevel, Action, ActionFlags, CustomRoleId, EffectivePermissionSet, ModuleId, NavItemId,
    SystemRoleId,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
    pub detail: Option<String>,
}

/// Per-action flags for a module or sidebar item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/action-flags.ts"
)]
pub struct ActionFlagsDto {
    #[serde(default)]
    pub view: bool,
    #[serde(default)]
    pub edit: bool,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub delete: bool,
    #[serde(default)]
    pub export: bool,
    #[serde(default)]
    pub approve: bool,
}

impl From<ActionFlags> for ActionFlagsDto {
    fn from(value: ActionFlags) -> Self {
        Self {
            view: value.view,
            edit: value.edit,
            create: value.create,
            delete: value.delete,
            export: value.export,
            approve: value.approve,
        }
    }
}

impl From<ActionFlagsDto> for ActionFlags {
    fn from(value: ActionFlagsDto) -> Self {
        Self {
            view: value.view,
            edit: value.edit,
            create: value.create,
            delete: value.delete,
            export: value.export,
            approve: value.approve,
        }
    }
}

/// Resolved permissions of one member.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/effective-permissions-response.ts"
)]
pub struct EffectivePermissionsResponse {
    pub tier: String,
    pub module_access: BTreeMap<String, String>,
    pub module_actions: BTreeMap<String, ActionFlagsDto>,
    pub sidebar_access: BTreeMap<String, ActionFlagsDto>,
    pub system_roles: Vec<String>,
}

impl From<EffectivePermissionSet> for EffectivePermissionsResponse {
    fn from(value: EffectivePermissionSet) -> Self {
        Self {
            tier: value.tier.as_str().to_owned(),
            module_access: value
                .module_access
                .into_iter()
                .map(|(module, level)| (module.as_str().to_owned(), level.as_str().to_owned()))
                .collect(),
            module_actions: value
                .module_actions
                .into_iter()
                .map(|(module, flags)| (module.as_str().to_owned(), flags.into()))
                .collect(),
            sidebar_access: value
                .sidebar_access
                .into_iter()
                .map(|(item, flags)| (item.as_str().to_owned(), flags.into()))
                .collect(),
            system_roles: role_strings(&value.system_roles),
        }
    }
}

pub(super) fn role_strings(roles: &BTreeSet<SystemRoleId>) -> Vec<String> {
    roles.iter().map(|role| role.as_str().to_owned()).collect()
}

pub(crate) fn parse_set<T>(values: Vec<String>) -> AppResult<BTreeSet<T>>
where
    T: FromStr<Err = AppError> + Ord,
{
    values.iter().map(|value| T::from_str(value)).collect()
}

pub(crate) fn parse_system_roles(values: Vec<String>) -> AppResult<BTreeSet<SystemRoleId>> {
    values.into_iter().map(SystemRoleId::new).collect()
}

pub(crate) fn parse_custom_role_ids(values: Vec<String>) -> AppResult<BTreeSet<CustomRoleId>> {
    values
        .iter()
        .map(|value| CustomRoleId::parse(value))
        .collect()
}

pub(crate) fn parse_module_access(
    values: BTreeMap<String, String>,
) -> AppResult<BTreeMap<ModuleId, AccessLevel>> {
    values
        .iter()
        .map(|(module, level)| Ok((ModuleId::from_str(module)?, AccessLevel::from_str(level)?)))
        .collect()
}

pub(crate) fn parse_sidebar_access(
    values: BTreeMap<String, ActionFlagsDto>,
) -> AppResult<BTreeMap<NavItemId, ActionFlags>> {
    values
        .into_iter()
        .map(|(item, flags)| Ok((NavItemId::from_str(&item)?, flags.into())))
        .collect()
}

pub(crate) fn parse_actions(values: BTreeMap<String, bool>) -> AppResult<BTreeMap<Action, bool>> {
    values
        .iter()
        .map(|(action, allowed)| Ok((Action::from_str(action)?, *allowed)))
        .collect()
}

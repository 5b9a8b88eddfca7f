use std::collections::BTreeMap;

use atelier_application::{CreateProfileInput, ProfilePatch};
use atelier_core::AppResult;
use atelier_domain::{AuditEntry, Profile, ProfileId};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::{
    ActionFlagsDto, parse_custom_role_ids, parse_module_access, parse_set, parse_sidebar_access,
    parse_system_roles, role_strings,
};

/// Incoming payload for profile creation.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-profile-request.ts"
)]
pub struct CreateProfileRequest {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub job_roles: Vec<String>,
    #[serde(default)]
    pub system_role_ids: Vec<String>,
    #[serde(default)]
    pub custom_role_ids: Vec<String>,
    #[serde(default)]
    pub module_access: BTreeMap<String, String>,
    #[serde(default)]
    pub sidebar_access: BTreeMap<String, ActionFlagsDto>,
    #[serde(default)]
    pub base_profile_id: Option<String>,
    #[serde(default)]
    pub seed_job_role: Option<String>,
}

impl CreateProfileRequest {
    pub fn into_input(self) -> AppResult<CreateProfileInput> {
        Ok(CreateProfileInput {
            name: self.name,
            kind: self.kind.as_deref().map(str::parse).transpose()?,
            tier: self.tier.as_deref().map(str::parse).transpose()?,
            job_roles: parse_set(self.job_roles)?,
            system_role_ids: parse_system_roles(self.system_role_ids)?,
            custom_role_ids: parse_custom_role_ids(self.custom_role_ids)?,
            module_access: parse_module_access(self.module_access)?,
            sidebar_access: parse_sidebar_access(self.sidebar_access)?,
            base_profile_id: self
                .base_profile_id
                .as_deref()
                .map(ProfileId::parse)
                .transpose()?,
            seed_job_role: self.seed_job_role.as_deref().map(str::parse).transpose()?,
        })
    }
}

/// Incoming payload for cloning an existing profile.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/clone-profile-request.ts"
)]
pub struct CloneProfileRequest {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
}

impl CloneProfileRequest {
    pub fn into_input(self) -> AppResult<CreateProfileInput> {
        CreateProfileRequest {
            name: self.name,
            kind: self.kind,
            tier: self.tier,
            ..CreateProfileRequest::default()
        }
        .into_input()
    }
}

/// Incoming payload for partial profile updates. Absent fields stay unchanged.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-profile-request.ts"
)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub job_roles: Option<Vec<String>>,
    #[serde(default)]
    pub system_role_ids: Option<Vec<String>>,
    #[serde(default)]
    pub custom_role_ids: Option<Vec<String>>,
    #[serde(default)]
    pub module_access: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub sidebar_access: Option<BTreeMap<String, ActionFlagsDto>>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl UpdateProfileRequest {
    pub fn into_patch(self) -> AppResult<ProfilePatch> {
        Ok(ProfilePatch {
            name: self.name,
            kind: self.kind.as_deref().map(str::parse).transpose()?,
            tier: self.tier.as_deref().map(str::parse).transpose()?,
            job_roles: self.job_roles.map(parse_set).transpose()?,
            system_role_ids: self.system_role_ids.map(parse_system_roles).transpose()?,
            custom_role_ids: self.custom_role_ids.map(parse_custom_role_ids).transpose()?,
            module_access: self.module_access.map(parse_module_access).transpose()?,
            sidebar_access: self.sidebar_access.map(parse_sidebar_access).transpose()?,
            reason: self.reason,
        })
    }
}

/// API representation of a permission profile.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/profile-response.ts"
)]
pub struct ProfileResponse {
    pub profile_id: String,
    pub name: String,
    pub kind: String,
    pub tier: String,
    pub job_roles: Vec<String>,
    pub system_role_ids: Vec<String>,
    pub custom_role_ids: Vec<String>,
    pub module_access: BTreeMap<String, String>,
    pub sidebar_access: BTreeMap<String, ActionFlagsDto>,
    pub is_system: bool,
    pub cloned_from: Option<String>,
    pub version: u64,
    pub updated_at: String,
}

impl From<Profile> for ProfileResponse {
    fn from(value: Profile) -> Self {
        Self {
            profile_id: value.id().to_string(),
            name: value.name().as_str().to_owned(),
            kind: value.kind().as_str().to_owned(),
            tier: value.tier().as_str().to_owned(),
            job_roles: value
                .job_roles()
                .iter()
                .map(|job_role| job_role.as_str().to_owned())
                .collect(),
            system_role_ids: role_strings(value.system_role_ids()),
            custom_role_ids: value
                .custom_role_ids()
                .iter()
                .map(ToString::to_string)
                .collect(),
            module_access: value
                .module_access()
                .iter()
                .map(|(module, level)| (module.as_str().to_owned(), level.as_str().to_owned()))
                .collect(),
            sidebar_access: value
                .sidebar_access()
                .iter()
                .map(|(item, flags)| (item.as_str().to_owned(), (*flags).into()))
                .collect(),
            is_system: value.is_system(),
            cloned_from: value.cloned_from().map(|profile_id| profile_id.to_string()),
            version: value.version(),
            updated_at: value.updated_at().to_rfc3339(),
        }
    }
}

/// One row of a profile's audit history.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-entry-response.ts"
)]
pub struct AuditEntryResponse {
    pub changed_by_user_id: String,
    pub changed_by_email: Option<String>,
    pub timestamp: String,
    pub action: String,
    pub field_changed: String,
    pub old_value: String,
    pub new_value: String,
    pub reason: Option<String>,
    pub affected_users_count: u64,
}

impl From<AuditEntry> for AuditEntryResponse {
    fn from(value: AuditEntry) -> Self {
        Self {
            changed_by_user_id: value.changed_by_user_id,
            changed_by_email: value.changed_by_email,
            timestamp: value.timestamp.to_rfc3339(),
            action: value.action.as_str().to_owned(),
            field_changed: value.field_changed,
            old_value: value.old_value,
            new_value: value.new_value,
            reason: value.reason,
            affected_users_count: value.affected_users_count,
        }
    }
}

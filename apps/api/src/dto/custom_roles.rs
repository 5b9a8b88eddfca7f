use atelier_domain::CustomRole;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::role_strings;

/// Incoming payload for custom role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-custom-role-request.ts"
)]
pub struct CreateCustomRoleRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system_role_ids: Vec<String>,
}

/// Incoming payload replacing a custom role's grants.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-custom-role-grants-request.ts"
)]
pub struct UpdateCustomRoleGrantsRequest {
    pub system_role_ids: Vec<String>,
}

/// API representation of a custom role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/custom-role-response.ts"
)]
pub struct CustomRoleResponse {
    pub custom_role_id: String,
    pub name: String,
    pub description: String,
    pub system_role_ids: Vec<String>,
}

impl From<CustomRole> for CustomRoleResponse {
    fn from(value: CustomRole) -> Self {
        Self {
            custom_role_id: value.id().to_string(),
            name: value.name().as_str().to_owned(),
            description: value.description().to_owned(),
            system_role_ids: role_strings(value.system_role_ids()),
        }
    }
}

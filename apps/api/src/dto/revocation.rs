use atelier_application::RevocationResult;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::role_strings;
use super::profiles::AuditEntryResponse;

/// Incoming payload for revoking or granting direct permissions.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-change-body.ts"
)]
pub struct PermissionChangeBody {
    pub permissions: Vec<String>,
    #[serde(default)]
    pub reason: String,
}

/// Outcome of a revocation or grant.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/revocation-response.ts"
)]
pub struct RevocationResponse {
    pub change: String,
    pub profile_id: String,
    pub user_id: String,
    pub changed: Vec<String>,
    pub system_role_ids: Vec<String>,
    pub audit_entry: AuditEntryResponse,
    pub stage: String,
    pub notification_warning: Option<String>,
    pub cache_warning: Option<String>,
    pub attempts: u32,
}

impl From<RevocationResult> for RevocationResponse {
    fn from(value: RevocationResult) -> Self {
        Self {
            change: value.change.as_str().to_owned(),
            profile_id: value.profile_id.to_string(),
            user_id: value.user_id,
            changed: role_strings(&value.changed),
            system_role_ids: role_strings(&value.system_role_ids),
            audit_entry: value.audit_entry.into(),
            stage: value.stage.as_str().to_owned(),
            notification_warning: value.notification_warning,
            cache_warning: value.cache_warning,
            attempts: value.attempts,
        }
    }
}

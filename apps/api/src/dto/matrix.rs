use std::collections::BTreeMap;

use atelier_application::{OverrideChange, PreviewRequest};
use atelier_core::{AppResult, TenantId};
use atelier_domain::{Action, GranularOverride, ProfileId};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::parse_actions;

/// Optional job-role filter for listing overrides.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/override-list-query.ts"
)]
pub struct OverrideListQuery {
    #[serde(default)]
    pub job_role: Option<String>,
}

/// Identifies one override entry.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/override-key-query.ts"
)]
pub struct OverrideKeyQuery {
    pub resource: String,
    pub job_role: String,
}

/// Incoming payload storing one override.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/set-override-request.ts"
)]
pub struct SetOverrideRequest {
    pub resource: String,
    pub job_role: String,
    pub actions: BTreeMap<String, bool>,
}

impl SetOverrideRequest {
    pub fn into_override(self, tenant_id: TenantId) -> AppResult<GranularOverride> {
        GranularOverride::new(
            tenant_id,
            self.resource.parse()?,
            self.job_role.parse()?,
            parse_actions(self.actions)?,
        )
    }
}

/// API representation of a granular override.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/granular-override-response.ts"
)]
pub struct GranularOverrideResponse {
    pub resource: String,
    pub job_role: String,
    pub actions: BTreeMap<String, bool>,
}

impl From<GranularOverride> for GranularOverrideResponse {
    fn from(value: GranularOverride) -> Self {
        Self {
            resource: value.resource().to_string(),
            job_role: value.job_role().as_str().to_owned(),
            actions: action_strings(value.actions()),
        }
    }
}

/// One diff step. `actions` present stores the entry, absent removes it.
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/override-change.ts"
)]
pub struct OverrideChangeDto {
    pub resource: String,
    pub job_role: String,
    #[serde(default)]
    pub actions: Option<BTreeMap<String, bool>>,
}

impl OverrideChangeDto {
    pub fn into_change(self, tenant_id: TenantId) -> AppResult<OverrideChange> {
        match self.actions {
            Some(actions) => Ok(OverrideChange::Set(
                SetOverrideRequest {
                    resource: self.resource,
                    job_role: self.job_role,
                    actions,
                }
                .into_override(tenant_id)?,
            )),
            None => Ok(OverrideChange::Remove {
                resource: self.resource.parse()?,
                job_role: self.job_role.parse()?,
            }),
        }
    }
}

impl From<OverrideChange> for OverrideChangeDto {
    fn from(value: OverrideChange) -> Self {
        match value {
            OverrideChange::Set(entry) => Self {
                resource: entry.resource().to_string(),
                job_role: entry.job_role().as_str().to_owned(),
                actions: Some(action_strings(entry.actions())),
            },
            OverrideChange::Remove { resource, job_role } => Self {
                resource: resource.to_string(),
                job_role: job_role.as_str().to_owned(),
                actions: None,
            },
        }
    }
}

/// Incoming payload submitting an explicit diff.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/apply-override-changes-request.ts"
)]
pub struct ApplyOverrideChangesRequest {
    pub changes: Vec<OverrideChangeDto>,
}

/// Incoming payload describing the complete desired override table.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/sync-overrides-request.ts"
)]
pub struct SyncOverridesRequest {
    pub desired: Vec<SetOverrideRequest>,
}

/// Changes submitted for a diff and how many were applied.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/apply-override-changes-response.ts"
)]
pub struct ApplyOverrideChangesResponse {
    pub changes: Vec<OverrideChangeDto>,
    pub applied: usize,
}

/// Incoming payload for previewing the matrix for a job role.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/preview-overrides-request.ts"
)]
pub struct PreviewOverridesRequest {
    pub job_role: String,
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub draft: Option<Vec<SetOverrideRequest>>,
}

impl PreviewOverridesRequest {
    pub fn into_preview(self, tenant_id: TenantId) -> AppResult<PreviewRequest> {
        Ok(PreviewRequest {
            job_role: self.job_role.parse()?,
            profile_id: self.profile_id.as_deref().map(ProfileId::parse).transpose()?,
            draft: self
                .draft
                .map(|draft| {
                    draft
                        .into_iter()
                        .map(|entry| entry.into_override(tenant_id))
                        .collect::<AppResult<Vec<_>>>()
                })
                .transpose()?,
        })
    }
}

fn action_strings(actions: &BTreeMap<Action, bool>) -> BTreeMap<String, bool> {
    actions
        .iter()
        .map(|(action, allowed)| (action.as_str().to_owned(), *allowed))
        .collect()
}

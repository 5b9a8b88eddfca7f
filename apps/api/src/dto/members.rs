use atelier_application::OnboardMemberInput;
use atelier_domain::Member;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for adding a member to the workshop.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/onboard-member-request.ts"
)]
pub struct OnboardMemberRequest {
    pub user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub job_role: String,
}

impl From<OnboardMemberRequest> for OnboardMemberInput {
    fn from(value: OnboardMemberRequest) -> Self {
        Self {
            user_id: value.user_id,
            display_name: value.display_name,
            email: value.email,
            job_role: value.job_role,
        }
    }
}

/// Incoming payload for attaching a profile to a member.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assign-profile-request.ts"
)]
pub struct AssignProfileRequest {
    pub profile_id: String,
}

/// API representation of a workshop member.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/member-response.ts"
)]
pub struct MemberResponse {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub job_role: String,
    pub profile_id: Option<String>,
}

impl From<Member> for MemberResponse {
    fn from(value: Member) -> Self {
        Self {
            user_id: value.user_id().to_owned(),
            display_name: value.display_name().to_owned(),
            email: value.email().map(|email| email.as_str().to_owned()),
            job_role: value.job_role().as_str().to_owned(),
            profile_id: value.profile_id().map(|profile_id| profile_id.to_string()),
        }
    }
}

/// Query for a single access decision, e.g. `resource=module:inventory&action=edit`.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-check-query.ts"
)]
pub struct AccessCheckQuery {
    pub resource: String,
    pub action: String,
}

/// Outcome of a single access decision.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-check-response.ts"
)]
pub struct AccessCheckResponse {
    pub resource: String,
    pub action: String,
    pub allowed: bool,
}

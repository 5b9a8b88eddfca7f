mod common;
mod custom_roles;
mod matrix;
mod members;
mod profiles;
mod revocation;

pub use common::{EffectivePermissionsResponse, HealthResponse};
pub(crate) use common::parse_system_roles;
pub use custom_roles::{CreateCustomRoleRequest, CustomRoleResponse, UpdateCustomRoleGrantsRequest};
pub use matrix::{
    ApplyOverrideChangesRequest, ApplyOverrideChangesResponse, GranularOverrideResponse,
    OverrideKeyQuery, OverrideListQuery, PreviewOverridesRequest, SetOverrideRequest,
    SyncOverridesRequest,
};
pub use members::{
    AccessCheckQuery, AccessCheckResponse, AssignProfileRequest, MemberResponse,
    OnboardMemberRequest,
};
pub use profiles::{
    AuditEntryResponse, CloneProfileRequest, CreateProfileRequest, ProfileResponse,
    UpdateProfileRequest,
};
pub use revocation::{PermissionChangeBody, RevocationResponse};

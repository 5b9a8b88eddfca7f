use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use atelier_core::{AppError, UserIdentity};
use atelier_domain::{CustomRoleId, ProfileId};

use crate::dto::{
    AccessCheckQuery, AccessCheckResponse, ApplyOverrideChangesRequest,
    ApplyOverrideChangesResponse, AssignProfileRequest, AuditEntryResponse, CloneProfileRequest,
    CreateCustomRoleRequest, CreateProfileRequest, CustomRoleResponse,
    EffectivePermissionsResponse, GranularOverrideResponse, MemberResponse, OnboardMemberRequest,
    OverrideKeyQuery, OverrideListQuery, PermissionChangeBody, PreviewOverridesRequest,
    ProfileResponse, RevocationResponse, SetOverrideRequest, SyncOverridesRequest,
    UpdateCustomRoleGrantsRequest, UpdateProfileRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod bootstrap;
mod custom_roles;
mod matrix;
mod members;
mod profiles;
mod revocation;


pub use bootstrap::{bootstrap_handler, seed_default_profiles_handler};
pub use custom_roles::{
    create_custom_role_handler, delete_custom_role_handler, list_custom_roles_handler,
    update_custom_role_grants_handler,
};
pub use matrix::{
    apply_override_changes_handler, delete_override_handler, list_overrides_handler,
    preview_overrides_handler, set_override_handler, sync_overrides_handler,
};
pub use members::{
    assign_profile_handler, check_access_handler, member_permissions_handler,
    my_permissions_handler, onboard_member_handler,
};
pub use profiles::{
    clone_profile_handler, create_profile_handler, delete_profile_handler, get_profile_handler,
    list_profiles_handler, profile_audit_log_handler, update_profile_handler,
};
pub use revocation::{grant_permissions_handler, revoke_permissions_handler};

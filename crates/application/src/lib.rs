//! Application services and ports.

#![forbid(unsafe_code)]

mod access_error;
mod access_ports;
mod audit_trail;
mod authorization_service;
mod cache_invalidation;
mod custom_role_service;
mod granular_matrix_service;
pub mod permission_resolver;
mod profile_service;
mod revocation_service;
mod tenant_bootstrap_service;

#[cfg(test)]
mod test_support;

pub use access_error::{AccessControlError, AccessResult, CustomRoleConflict};
pub use access_ports::{
    AccessRepositories, CustomRoleRepository, GranularOverrideRepository, MemberRepository,
    Notification, NotificationSender, PermissionCache, ProfileRepository, ProfileWrite,
};
pub use authorization_service::AuthorizationService;
pub use custom_role_service::{CreateCustomRoleInput, CustomRoleService};
pub use granular_matrix_service::{
    GranularMatrixService, OverrideChange, PreviewRequest, diff_overrides,
};
pub use permission_resolver::{ResolutionInput, ResolutionLayer, resolve_permissions};
pub use profile_service::{CreateProfileInput, OnboardMemberInput, ProfilePatch, ProfileService};
pub use revocation_service::{
    PermissionChange, PermissionChangeRequest, RevocationResult, RevocationService,
    RevocationStage,
};
pub use tenant_bootstrap_service::{ADMINISTRATOR_PROFILE_NAME, TenantBootstrapService};

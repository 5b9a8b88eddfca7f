use atelier_core::{AppError, ErrorCategory};
use atelier_domain::{CustomRoleId, ProfileId, SystemRoleId};
use thiserror::Error;

/// Result type returned by access-control use-cases.
pub type AccessResult<T> = Result<T, AccessControlError>;

/// A selected permission that reaches the member through custom roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomRoleConflict {
    /// Permission the operator tried to revoke.
    pub permission: SystemRoleId,
    /// Every referenced custom role granting it, ordered by name.
    pub custom_roles: Vec<(CustomRoleId, String)>,
}

/// Failures surfaced by access-control use-cases.
///
/// Each case keeps its specific meaning so administrative surfaces can show
/// the exact reason instead of a generic failure.
#[derive(Debug, Error)]
pub enum AccessControlError {
    /// Malformed or incomplete input.
    #[error("{0}")]
    Validation(String),

    /// No membership exists for the user in the workshop.
    #[error("member '{user_id}' was not found in this workshop")]
    MemberNotFound {
        /// Requested user id.
        user_id: String,
    },

    /// Member exists but has no profile to mutate.
    #[error("member '{user_id}' has no permission profile assigned")]
    NoProfileAssigned {
        /// Requested user id.
        user_id: String,
    },

    /// Referenced profile does not exist.
    #[error("permission profile '{profile_id}' was not found")]
    ProfileNotFound {
        /// Missing profile id.
        profile_id: ProfileId,
    },

    /// Referenced custom role does not exist.
    #[error("custom role '{custom_role_id}' was not found")]
    CustomRoleNotFound {
        /// Missing custom role id.
        custom_role_id: CustomRoleId,
    },

    /// Another profile in the workshop already uses the name.
    #[error("a profile with the name '{name}' already exists")]
    DuplicateName {
        /// Requested name.
        name: String,
    },

    /// Another custom role in the workshop already uses the name.
    #[error("a custom role with the name '{name}' already exists")]
    DuplicateCustomRoleName {
        /// Requested name.
        name: String,
    },

    /// Profile cannot be deleted while members hold it.
    #[error("profile '{name}' is assigned to {member_count} member(s); reassign them first")]
    ProfileInUse {
        /// Profile name.
        name: String,
        /// Members still referencing the profile.
        member_count: u64,
    },

    /// Custom role cannot be deleted while profiles reference it.
    #[error("custom role '{name}' is referenced by profile(s): {}", .profiles.join(", "))]
    CustomRoleInUse {
        /// Custom role name.
        name: String,
        /// Names of referencing profiles.
        profiles: Vec<String>,
    },

    /// Structural edit attempted on a platform-managed profile.
    #[error("system profile '{name}' cannot be renamed, re-kinded, or deleted")]
    SystemProfileImmutable {
        /// Profile name.
        name: String,
    },

    /// Selection is inconsistent with the member's current grants.
    #[error("{detail}: {}", join_roles(.permissions))]
    InvalidSelection {
        /// Offending permissions.
        permissions: Vec<SystemRoleId>,
        /// What is wrong with them.
        detail: &'static str,
    },

    /// Selected permissions are granted through custom roles.
    #[error("{}", describe_custom_role_conflicts(.conflicts))]
    PermissionViaCustomRole {
        /// One entry per conflicting permission.
        conflicts: Vec<CustomRoleConflict>,
    },

    /// Optimistic concurrency retries ran out.
    #[error("profile '{profile_id}' kept changing concurrently; gave up after {attempts} attempt(s)")]
    ConcurrentModification {
        /// Contended profile.
        profile_id: ProfileId,
        /// Attempts made.
        attempts: u32,
    },

    /// An override diff failed part-way; the first `applied` changes stay written.
    #[error("override changes stopped after {applied} of {total} were applied: {source}")]
    OverrideDiffInterrupted {
        /// Changes written before the failure.
        applied: usize,
        /// Changes submitted.
        total: usize,
        /// Store failure that stopped the diff.
        source: AppError,
    },

    /// Caller lacks the administrative capability.
    #[error("{0}")]
    Forbidden(String),

    /// Record store, cache, or notification channel failure.
    #[error(transparent)]
    Store(#[from] AppError),
}

impl AccessControlError {
    /// Returns the taxonomy category of the error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::MemberNotFound { .. }
            | Self::ProfileNotFound { .. }
            | Self::CustomRoleNotFound { .. } => ErrorCategory::NotFound,
            Self::DuplicateName { .. }
            | Self::DuplicateCustomRoleName { .. }
            | Self::ProfileInUse { .. }
            | Self::CustomRoleInUse { .. }
            | Self::SystemProfileImmutable { .. }
            | Self::ConcurrentModification { .. } => ErrorCategory::Conflict,
            Self::NoProfileAssigned { .. }
            | Self::InvalidSelection { .. }
            | Self::PermissionViaCustomRole { .. } => ErrorCategory::State,
            Self::Forbidden(_) => ErrorCategory::Forbidden,
            Self::OverrideDiffInterrupted { source, .. } => source.category(),
            Self::Store(error) => error.category(),
        }
    }
}

impl From<AccessControlError> for AppError {
    fn from(value: AccessControlError) -> Self {
        let message = value.to_string();
        match value {
            AccessControlError::Store(error) => error,
            other => match other.category() {
                ErrorCategory::Validation => Self::Validation(message),
                ErrorCategory::NotFound => Self::NotFound(message),
                ErrorCategory::Conflict => Self::Conflict(message),
                ErrorCategory::State => Self::State(message),
                ErrorCategory::Unauthorized => Self::Unauthorized(message),
                ErrorCategory::Forbidden => Self::Forbidden(message),
                ErrorCategory::Dependency => Self::Dependency(message),
                ErrorCategory::Internal => Self::Internal(message),
            },
        }
    }
}

fn join_roles(permissions: &[SystemRoleId]) -> String {
    permissions
        .iter()
        .map(SystemRoleId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_custom_role_conflicts(conflicts: &[CustomRoleConflict]) -> String {
    let described = conflicts
        .iter()
        .map(|conflict| {
            let roles = conflict
                .custom_roles
                .iter()
                .map(|(_, name)| format!("'{name}'"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("'{}' via {roles}", conflict.permission)
        })
        .collect::<Vec<_>>()
        .join("; ");

    format!(
        "permission(s) granted through custom roles must be removed by editing the role association: {described}"
    )
}

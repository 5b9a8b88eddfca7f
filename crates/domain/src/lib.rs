//! Domain entities and invariants for workshop access control.

#![forbid(unsafe_code)]

mod access;
mod catalog;
mod custom_role;
mod defaults;
mod granular;
mod member;
mod permission_set;
mod profile;

pub use access::{AccessLevel, Action, ActionFlags};
pub use catalog::{JobRole, ModuleId, NavItemId, ProfileKind, Tier};
pub use custom_role::{CustomRole, CustomRoleId};
pub use defaults::{JobRoleDefaults, blocked_module_access};
pub use granular::{GranularOverride, Resource};
pub use member::{EmailAddress, Member};
pub use permission_set::EffectivePermissionSet;
pub use profile::{AuditAction, AuditEntry, Profile, ProfileId, ProfileParts, SystemRoleId};

/// System role that lets a member administer profiles, roles, and overrides.
pub const ACCESS_MANAGE_ROLE: &str = "access.manage";

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use atelier_core::{AppError, AppResult, NonEmptyString, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::blocked_module_access;
use crate::{AccessLevel, ActionFlags, CustomRoleId, JobRole, ModuleId, NavItemId, ProfileKind, Tier};

/// Unique identifier for a permission profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileId(Uuid);

impl ProfileId {
    /// Creates a new random profile identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a profile identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a profile identifier from its transport representation.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid profile id '{value}': {error}")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ProfileId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Atomic permission grant such as `reports.export`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SystemRoleId(String);

impl SystemRoleId {
    /// Creates a validated system role identifier.
    ///
    /// Accepts lowercase ASCII letters, digits, `.`, `_`, `-`, and `:`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "system role id must not be empty".to_owned(),
            ));
        }

        let valid = trimmed.chars().all(|character| {
            character.is_ascii_lowercase()
                || character.is_ascii_digit()
                || matches!(character, '.' | '_' | '-' | ':')
        });
        if !valid {
            return Err(AppError::Validation(format!(
                "system role id '{trimmed}' may only contain lowercase letters, digits, '.', '_', '-', ':'"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for SystemRoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for SystemRoleId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SystemRoleId> for String {
    fn from(value: SystemRoleId) -> Self {
        value.0
    }
}

/// Stable audit actions appended to a profile's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Directly granted system roles were removed.
    RevokePermissions,
    /// System roles were granted directly.
    GrantPermissions,
    /// A permission field was edited by an administrator.
    ProfileUpdated,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RevokePermissions => "revoke_permissions",
            Self::GrantPermissions => "grant_permissions",
            Self::ProfileUpdated => "profile_updated",
        }
    }
}

impl std::str::FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "revoke_permissions" => Ok(Self::RevokePermissions),
            "grant_permissions" => Ok(Self::GrantPermissions),
            "profile_updated" => Ok(Self::ProfileUpdated),
            _ => Err(AppError::Validation(format!(
                "unknown audit action '{value}'"
            ))),
        }
    }
}

/// One immutable entry in a profile's audit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Administrator who made the change.
    pub changed_by_user_id: String,
    /// Administrator email at the time of the change.
    pub changed_by_email: Option<String>,
    /// When the change was applied.
    pub timestamp: DateTime<Utc>,
    /// What kind of change this was.
    pub action: AuditAction,
    /// Profile field that changed.
    pub field_changed: String,
    /// Serialized value before the change.
    pub old_value: String,
    /// Serialized value after the change.
    pub new_value: String,
    /// Operator-supplied justification.
    pub reason: Option<String>,
    /// Members holding the profile when the change was applied.
    pub affected_users_count: u64,
}

/// Decomposed profile state used to build and persist [`Profile`] values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileParts {
    /// Profile identifier.
    pub id: ProfileId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name, unique per tenant ignoring case.
    pub name: String,
    /// Intended audience.
    pub kind: ProfileKind,
    /// Coarse tier.
    pub tier: Tier,
    /// Job roles that auto-attach this profile to new members.
    pub job_roles: BTreeSet<JobRole>,
    /// Directly granted system roles.
    pub system_role_ids: BTreeSet<SystemRoleId>,
    /// Referenced custom roles.
    pub custom_role_ids: BTreeSet<CustomRoleId>,
    /// Module access; missing modules are stored as blocked.
    pub module_access: BTreeMap<ModuleId, AccessLevel>,
    /// Explicit sidebar flags; missing items inherit job-role defaults.
    pub sidebar_access: BTreeMap<NavItemId, ActionFlags>,
    /// Platform-managed profile flag.
    pub is_system: bool,
    /// Source profile when created as a clone.
    pub cloned_from: Option<ProfileId>,
    /// Ordered audit history.
    pub audit_log: Vec<AuditEntry>,
    /// Optimistic concurrency version.
    pub version: u64,
    /// Last write timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Tenant-scoped, named permission bundle attachable to members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    id: ProfileId,
    tenant_id: TenantId,
    name: NonEmptyString,
    kind: ProfileKind,
    tier: Tier,
    job_roles: BTreeSet<JobRole>,
    system_role_ids: BTreeSet<SystemRoleId>,
    custom_role_ids: BTreeSet<CustomRoleId>,
    module_access: BTreeMap<ModuleId, AccessLevel>,
    sidebar_access: BTreeMap<NavItemId, ActionFlags>,
    is_system: bool,
    cloned_from: Option<ProfileId>,
    audit_log: Vec<AuditEntry>,
    version: u64,
    updated_at: DateTime<Utc>,
}

impl Profile {
    /// Builds a validated profile from its parts.
    pub fn from_parts(parts: ProfileParts) -> AppResult<Self> {
        let mut module_access = blocked_module_access();
        module_access.extend(parts.module_access);

        Ok(Self {
            id: parts.id,
            tenant_id: parts.tenant_id,
            name: NonEmptyString::new(parts.name)?,
            kind: parts.kind,
            tier: parts.tier,
            job_roles: parts.job_roles,
            system_role_ids: parts.system_role_ids,
            custom_role_ids: parts.custom_role_ids,
            module_access,
            sidebar_access: parts.sidebar_access,
            is_system: parts.is_system,
            cloned_from: parts.cloned_from,
            audit_log: parts.audit_log,
            version: parts.version,
            updated_at: parts.updated_at,
        })
    }

    /// Decomposes the profile for persistence.
    #[must_use]
    pub fn into_parts(self) -> ProfileParts {
        ProfileParts {
            id: self.id,
            tenant_id: self.tenant_id,
            name: self.name.into(),
            kind: self.kind,
            tier: self.tier,
            job_roles: self.job_roles,
            system_role_ids: self.system_role_ids,
            custom_role_ids: self.custom_role_ids,
            module_access: self.module_access,
            sidebar_access: self.sidebar_access,
            is_system: self.is_system,
            cloned_from: self.cloned_from,
            audit_log: self.audit_log,
            version: self.version,
            updated_at: self.updated_at,
        }
    }

    /// Returns the profile identifier.
    #[must_use]
    pub fn id(&self) -> ProfileId {
        self.id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the intended audience.
    #[must_use]
    pub fn kind(&self) -> ProfileKind {
        self.kind
    }

    /// Returns the coarse tier.
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Returns job roles that auto-attach this profile.
    #[must_use]
    pub fn job_roles(&self) -> &BTreeSet<JobRole> {
        &self.job_roles
    }

    /// Returns directly granted system roles.
    #[must_use]
    pub fn system_role_ids(&self) -> &BTreeSet<SystemRoleId> {
        &self.system_role_ids
    }

    /// Returns referenced custom roles.
    #[must_use]
    pub fn custom_role_ids(&self) -> &BTreeSet<CustomRoleId> {
        &self.custom_role_ids
    }

    /// Returns module access for every module.
    #[must_use]
    pub fn module_access(&self) -> &BTreeMap<ModuleId, AccessLevel> {
        &self.module_access
    }

    /// Returns explicit sidebar flags.
    #[must_use]
    pub fn sidebar_access(&self) -> &BTreeMap<NavItemId, ActionFlags> {
        &self.sidebar_access
    }

    /// Returns whether the profile is platform-managed.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.is_system
    }

    /// Returns the source profile for clones.
    #[must_use]
    pub fn cloned_from(&self) -> Option<ProfileId> {
        self.cloned_from
    }

    /// Returns the ordered audit history.
    #[must_use]
    pub fn audit_log(&self) -> &[AuditEntry] {
        self.audit_log.as_slice()
    }

    /// Returns the optimistic concurrency version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the last write timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Renames the profile.
    pub fn rename(&mut self, name: NonEmptyString) {
        self.name = name;
    }

    /// Changes the intended audience.
    pub fn set_kind(&mut self, kind: ProfileKind) {
        self.kind = kind;
    }

    /// Changes the coarse tier.
    pub fn set_tier(&mut self, tier: Tier) {
        self.tier = tier;
    }

    /// Replaces the auto-attach job roles.
    pub fn set_job_roles(&mut self, job_roles: BTreeSet<JobRole>) {
        self.job_roles = job_roles;
    }

    /// Replaces directly granted system roles.
    pub fn set_system_role_ids(&mut self, system_role_ids: BTreeSet<SystemRoleId>) {
        self.system_role_ids = system_role_ids;
    }

    /// Replaces custom role references.
    pub fn set_custom_role_ids(&mut self, custom_role_ids: BTreeSet<CustomRoleId>) {
        self.custom_role_ids = custom_role_ids;
    }

    /// Replaces module access; modules left out become blocked.
    pub fn set_module_access(&mut self, module_access: BTreeMap<ModuleId, AccessLevel>) {
        let mut complete = blocked_module_access();
        complete.extend(module_access);
        self.module_access = complete;
    }

    /// Replaces explicit sidebar flags.
    pub fn set_sidebar_access(&mut self, sidebar_access: BTreeMap<NavItemId, ActionFlags>) {
        self.sidebar_access = sidebar_access;
    }

    /// Appends an entry to the audit history.
    pub fn record_audit(&mut self, entry: AuditEntry) {
        self.audit_log.push(entry);
    }

    /// Marks the profile as persisted at the next version.
    pub fn advance_version(&mut self, written_at: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = written_at;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use atelier_core::TenantId;
    use chrono::Utc;

    use super::{Profile, ProfileId, ProfileParts, SystemRoleId};
    use crate::{AccessLevel, ModuleId, ProfileKind, Tier};

    fn parts(name: &str) -> ProfileParts {
        ProfileParts {
            id: ProfileId::new(),
            tenant_id: TenantId::new(),
            name: name.to_owned(),
            kind: ProfileKind::Internal,
            tier: Tier::Viewer,
            job_roles: BTreeSet::new(),
            system_role_ids: BTreeSet::new(),
            custom_role_ids: BTreeSet::new(),
            module_access: BTreeMap::from([(ModuleId::Dashboard, AccessLevel::View)]),
            sidebar_access: BTreeMap::new(),
            is_system: false,
            cloned_from: None,
            audit_log: Vec::new(),
            version: 0,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn from_parts_fills_missing_modules_as_blocked() {
        let profile = Profile::from_parts(parts("Recepção"));
        assert!(profile.is_ok());

        let profile = profile.unwrap_or_else(|_| unreachable!());
        assert_eq!(profile.module_access().len(), ModuleId::all().len());
        assert_eq!(
            profile.module_access().get(&ModuleId::Financial),
            Some(&AccessLevel::Blocked)
        );
    }

    #[test]
    fn from_parts_rejects_blank_name() {
        assert!(Profile::from_parts(parts("  ")).is_err());
    }

    #[test]
    fn system_role_id_rejects_uppercase_and_spaces() {
        assert!(SystemRoleId::new("reports.export").is_ok());
        assert!(SystemRoleId::new("Reports.Export").is_err());
        assert!(SystemRoleId::new("reports export").is_err());
    }

    #[test]
    fn advance_version_increments() {
        let profile = Profile::from_parts(parts("Oficina"));
        assert!(profile.is_ok());

        let mut profile = profile.unwrap_or_else(|_| unreachable!());
        profile.advance_version(Utc::now());
        assert_eq!(profile.version(), 1);
    }
}

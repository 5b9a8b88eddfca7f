use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use atelier_core::{AppError, AppResult, NonEmptyString, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::SystemRoleId;

/// Unique identifier for a custom role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomRoleId(Uuid);

impl CustomRoleId {
    /// Creates a new random custom role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a custom role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a custom role identifier from its transport representation.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim()).map(Self).map_err(|error| {
            AppError::Validation(format!("invalid custom role id '{value}': {error}"))
        })
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CustomRoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CustomRoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Reusable bundle of system roles that profiles include by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomRole {
    id: CustomRoleId,
    tenant_id: TenantId,
    name: NonEmptyString,
    description: String,
    system_role_ids: BTreeSet<SystemRoleId>,
}

impl CustomRole {
    /// Creates a validated custom role.
    pub fn new(
        id: CustomRoleId,
        tenant_id: TenantId,
        name: impl Into<String>,
        description: impl Into<String>,
        system_role_ids: BTreeSet<SystemRoleId>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            tenant_id,
            name: NonEmptyString::new(name)?,
            description: description.into().trim().to_owned(),
            system_role_ids,
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> CustomRoleId {
        self.id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the granted system roles.
    #[must_use]
    pub fn system_role_ids(&self) -> &BTreeSet<SystemRoleId> {
        &self.system_role_ids
    }

    /// Replaces the granted system roles.
    pub fn set_system_role_ids(&mut self, system_role_ids: BTreeSet<SystemRoleId>) {
        self.system_role_ids = system_role_ids;
    }
}

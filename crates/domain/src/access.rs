use std::str::FromStr;

use atelier_core::AppError;
use serde::{Deserialize, Serialize};

/// Module-level access granted to a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Module is hidden and every action is denied.
    Blocked,
    /// Module can be opened read-only.
    View,
    /// Every action in the module is allowed.
    Full,
}

impl AccessLevel {
    /// Returns a stable storage value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocked => "blocked",
            Self::View => "view",
            Self::Full => "full",
        }
    }

    /// Returns the action flags implied by the level before any override.
    #[must_use]
    pub fn implied_actions(&self) -> ActionFlags {
        match self {
            Self::Blocked => ActionFlags::none(),
            Self::View => ActionFlags::view_only(),
            Self::Full => ActionFlags::all(),
        }
    }
}

impl FromStr for AccessLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "blocked" => Ok(Self::Blocked),
            "view" => Ok(Self::View),
            "full" => Ok(Self::Full),
            _ => Err(AppError::Validation(format!(
                "unknown access level '{value}'"
            ))),
        }
    }
}

/// Record-level action gated by sidebar permissions and granular overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Open or read records.
    View,
    /// Update existing records.
    Edit,
    /// Create records.
    Create,
    /// Delete records.
    Delete,
    /// Export records.
    Export,
    /// Approve records.
    Approve,
}

impl Action {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Export => "export",
            Self::Approve => "approve",
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Action] = &[
            Action::View,
            Action::Edit,
            Action::Create,
            Action::Delete,
            Action::Export,
            Action::Approve,
        ];

        ALL
    }
}

impl FromStr for Action {
    type Err = AppError;

    /// Accepts the CRUD spellings used by the matrix editor as aliases.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "view" | "read" => Ok(Self::View),
            "edit" | "update" => Ok(Self::Edit),
            "create" => Ok(Self::Create),
            "delete" => Ok(Self::Delete),
            "export" => Ok(Self::Export),
            "approve" => Ok(Self::Approve),
            _ => Err(AppError::Validation(format!("unknown action '{value}'"))),
        }
    }
}

/// Boolean grant per action for one sidebar item or module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionFlags {
    /// Allows opening or reading.
    #[serde(default)]
    pub view: bool,
    /// Allows updating.
    #[serde(default)]
    pub edit: bool,
    /// Allows creating.
    #[serde(default)]
    pub create: bool,
    /// Allows deleting.
    #[serde(default)]
    pub delete: bool,
    /// Allows exporting.
    #[serde(default)]
    pub export: bool,
    /// Allows approving.
    #[serde(default)]
    pub approve: bool,
}

impl ActionFlags {
    /// Every action denied.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            view: false,
            edit: false,
            create: false,
            delete: false,
            export: false,
            approve: false,
        }
    }

    /// Every action allowed.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            view: true,
            edit: true,
            create: true,
            delete: true,
            export: true,
            approve: true,
        }
    }

    /// Only `view` allowed.
    #[must_use]
    pub const fn view_only() -> Self {
        Self {
            view: true,
            ..Self::none()
        }
    }

    /// Returns the flag for one action.
    #[must_use]
    pub fn get(&self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::Edit => self.edit,
            Action::Create => self.create,
            Action::Delete => self.delete,
            Action::Export => self.export,
            Action::Approve => self.approve,
        }
    }

    /// Sets the flag for one action.
    pub fn set(&mut self, action: Action, allowed: bool) {
        let slot = match action {
            Action::View => &mut self.view,
            Action::Edit => &mut self.edit,
            Action::Create => &mut self.create,
            Action::Delete => &mut self.delete,
            Action::Export => &mut self.export,
            Action::Approve => &mut self.approve,
        };
        *slot = allowed;
    }

    /// Returns whether no action is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Action::all().iter().all(|action| !self.get(*action))
    }

    /// Returns the allowed actions in declaration order.
    #[must_use]
    pub fn granted(&self) -> Vec<Action> {
        Action::all()
            .iter()
            .copied()
            .filter(|action| self.get(*action))
            .collect()
    }
}

//! Shared primitives for all Rust crates in Atelier.

#![forbid(unsafe_code)]

/// Caller identity primitives shared across services.
pub mod identity;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use identity::UserIdentity;

/// Result type used across Atelier crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string. Surrounding whitespace is trimmed.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Compares two values ignoring case.
    #[must_use]
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.to_lowercase() == other.trim().to_lowercase()
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Tenant (workshop) identifier used as the partition key for every persisted resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Creates a random tenant identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a tenant identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a tenant identifier from its transport representation.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid tenant id '{value}': {error}")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TenantId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Coarse error classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or incomplete input.
    Validation,
    /// Target entity is missing.
    NotFound,
    /// Write conflicts with existing state.
    Conflict,
    /// Well-formed request inconsistent with current state.
    State,
    /// Caller identity is missing.
    Unauthorized,
    /// Caller lacks the required capability.
    Forbidden,
    /// Backing store or delivery channel failed.
    Dependency,
    /// Unexpected internal failure.
    Internal,
}

impl ErrorCategory {
    /// Returns a stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::State => "state",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Dependency => "dependency",
            Self::Internal => "internal",
        }
    }

    /// Returns whether an automatic retry could ever help.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Dependency)
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Request is well-formed but inconsistent with current state.
    #[error("state error: {0}")]
    State(String),

    /// User is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// External collaborator (record store, notification channel) failed.
    #[error("dependency error: {0}")]
    Dependency(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Conflict(_) => ErrorCategory::Conflict,
            Self::State(_) => ErrorCategory::State,
            Self::Unauthorized(_) => ErrorCategory::Unauthorized,
            Self::Forbidden(_) => ErrorCategory::Forbidden,
            Self::Dependency(_) => ErrorCategory::Dependency,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

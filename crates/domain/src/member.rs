use atelier_core::{AppError, AppResult, NonEmptyString, TenantId};
use serde::{Deserialize, Serialize};

use crate::{JobRole, ProfileId};

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated, lowercased email address.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain '@'".to_owned(),
            ));
        };

        if local.is_empty() || domain.contains('@') {
            return Err(AppError::Validation(format!(
                "email address '{trimmed}' is malformed"
            )));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// A user's membership in one workshop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    user_id: NonEmptyString,
    tenant_id: TenantId,
    display_name: String,
    email: Option<EmailAddress>,
    job_role: JobRole,
    profile_id: Option<ProfileId>,
}

impl Member {
    /// Creates a member record.
    pub fn new(
        user_id: impl Into<String>,
        tenant_id: TenantId,
        display_name: impl Into<String>,
        email: Option<EmailAddress>,
        job_role: JobRole,
        profile_id: Option<ProfileId>,
    ) -> AppResult<Self> {
        Ok(Self {
            user_id: NonEmptyString::new(user_id)?,
            tenant_id,
            display_name: display_name.into(),
            email,
            job_role,
            profile_id,
        })
    }

    /// Returns the identity-provider user id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.user_id.as_str()
    }

    /// Returns the workshop.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the notification email, if known.
    #[must_use]
    pub fn email(&self) -> Option<&EmailAddress> {
        self.email.as_ref()
    }

    /// Returns the member's job function.
    #[must_use]
    pub fn job_role(&self) -> JobRole {
        self.job_role
    }

    /// Returns the attached profile, if any.
    #[must_use]
    pub fn profile_id(&self) -> Option<ProfileId> {
        self.profile_id
    }

    /// Attaches or detaches a profile.
    pub fn set_profile_id(&mut self, profile_id: Option<ProfileId>) {
        self.profile_id = profile_id;
    }
}

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult, TenantId};

/// Caller identity supplied by the external identity provider.
///
/// The access-control services never authenticate anyone themselves; they
/// trust whatever the surrounding request handler resolved as the current
/// user and tenant (workshop).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    user_id: String,
    display_name: String,
    email: Option<String>,
    tenant_id: TenantId,
}

impl UserIdentity {
    /// Creates an identity for one user inside one tenant.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        email: Option<String>,
        tenant_id: TenantId,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            email,
            tenant_id,
        }
    }

    /// Creates an identity, rejecting a blank user id.
    pub fn parse(
        user_id: &str,
        display_name: Option<&str>,
        email: Option<&str>,
        tenant_id: TenantId,
    ) -> AppResult<Self> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::Unauthorized(
                "identity is missing a user id".to_owned(),
            ));
        }

        let email = email
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);

        Ok(Self::new(
            user_id,
            display_name.map(str::trim).unwrap_or(user_id),
            email,
            tenant_id,
        ))
    }

    /// Returns the stable user id issued by the identity provider.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.user_id.as_str()
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if the provider returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the tenant (workshop) the user is acting in.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

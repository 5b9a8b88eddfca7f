use std::collections::BTreeSet;
use std::sync::Arc;

use atelier_core::UserIdentity;
use atelier_domain::{CustomRole, CustomRoleId, SystemRoleId};
use tracing::info;

use crate::cache_invalidation::{StaleScope, invalidate_after_commit};
use crate::{
    AccessControlError, AccessRepositories, AccessResult, AuthorizationService, PermissionCache,
};

/// Input payload for custom role creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCustomRoleInput {
    /// Name, unique per workshop ignoring case.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// System roles the custom role grants.
    pub system_role_ids: BTreeSet<SystemRoleId>,
}

/// Application service for tenant custom roles.
#[derive(Clone)]
pub struct CustomRoleService {
    authorization_service: AuthorizationService,
    repositories: AccessRepositories,
    cache: Arc<dyn PermissionCache>,
}

impl CustomRoleService {
    /// Creates a new custom role service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repositories: AccessRepositories,
        cache: Arc<dyn PermissionCache>,
    ) -> Self {
        Self {
            authorization_service,
            repositories,
            cache,
        }
    }

    /// Lists the workshop's custom roles ordered by name.
    pub async fn list_custom_roles(&self, actor: &UserIdentity) -> AccessResult<Vec<CustomRole>> {
        self.authorization_service.require_admin(actor).await?;
        Ok(self
            .repositories
            .custom_roles
            .list_custom_roles(actor.tenant_id())
            .await?)
    }

    /// Creates a custom role.
    pub async fn create_custom_role(
        &self,
        actor: &UserIdentity,
        input: CreateCustomRoleInput,
    ) -> AccessResult<CustomRole> {
        self.authorization_service.require_admin(actor).await?;

        let tenant_id = actor.tenant_id();
        let custom_role = CustomRole::new(
            CustomRoleId::new(),
            tenant_id,
            input.name,
            input.description,
            input.system_role_ids,
        )
        .map_err(|_| {
            AccessControlError::Validation("custom role name must not be empty".to_owned())
        })?;

        let existing = self
            .repositories
            .custom_roles
            .list_custom_roles(tenant_id)
            .await?;
        if existing
            .iter()
            .any(|other| other.name().eq_ignore_case(custom_role.name().as_str()))
        {
            return Err(AccessControlError::DuplicateCustomRoleName {
                name: custom_role.name().to_string(),
            });
        }

        self.repositories
            .custom_roles
            .save_custom_role(custom_role.clone())
            .await?;
        info!(%tenant_id, custom_role_id = %custom_role.id(), "custom role created");

        Ok(custom_role)
    }

    /// Replaces the system roles a custom role grants.
    pub async fn update_custom_role_grants(
        &self,
        actor: &UserIdentity,
        custom_role_id: CustomRoleId,
        system_role_ids: BTreeSet<SystemRoleId>,
    ) -> AccessResult<CustomRole> {
        self.authorization_service.require_admin(actor).await?;

        let tenant_id = actor.tenant_id();
        let mut custom_role = self.load_custom_role(actor, custom_role_id).await?;
        custom_role.set_system_role_ids(system_role_ids);

        self.repositories
            .custom_roles
            .save_custom_role(custom_role.clone())
            .await?;
        invalidate_after_commit(self.cache.as_ref(), tenant_id, StaleScope::Tenant).await;
        info!(%tenant_id, %custom_role_id, "custom role grants updated");

        Ok(custom_role)
    }

    /// Deletes a custom role no profile references.
    pub async fn delete_custom_role(
        &self,
        actor: &UserIdentity,
        custom_role_id: CustomRoleId,
    ) -> AccessResult<()> {
        self.authorization_service.require_admin(actor).await?;

        let tenant_id = actor.tenant_id();
        let custom_role = self.load_custom_role(actor, custom_role_id).await?;
        let profiles: Vec<String> = self
            .repositories
            .profiles
            .list_profiles(tenant_id)
            .await?
            .iter()
            .filter(|profile| profile.custom_role_ids().contains(&custom_role_id))
            .map(|profile| profile.name().to_string())
            .collect();
        if !profiles.is_empty() {
            return Err(AccessControlError::CustomRoleInUse {
                name: custom_role.name().to_string(),
                profiles,
            });
        }

        self.repositories
            .custom_roles
            .delete_custom_role(tenant_id, custom_role_id)
            .await?;
        invalidate_after_commit(self.cache.as_ref(), tenant_id, StaleScope::Tenant).await;
        info!(%tenant_id, %custom_role_id, "custom role deleted");

        Ok(())
    }

    async fn load_custom_role(
        &self,
        actor: &UserIdentity,
        custom_role_id: CustomRoleId,
    ) -> AccessResult<CustomRole> {
        self.repositories
            .custom_roles
            .find_custom_role(actor.tenant_id(), custom_role_id)
            .await?
            .filter(|custom_role| custom_role.tenant_id() == actor.tenant_id())
            .ok_or(AccessControlError::CustomRoleNotFound { custom_role_id })
    }
}

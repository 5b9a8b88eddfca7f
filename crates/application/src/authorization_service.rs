use std::sync::Arc;

use atelier_core::{TenantId, UserIdentity};
use atelier_domain::{
    ACCESS_MANAGE_ROLE, Action, EffectivePermissionSet, JobRole, Member, Profile, ProfileId,
    Resource, Tier,
};
use tracing::{debug, warn};

use crate::permission_resolver::{ResolutionInput, resolve_permissions};
use crate::{AccessControlError, AccessRepositories, AccessResult, PermissionCache};

/// Application service for decision-time permission checks.
#[derive(Clone)]
pub struct AuthorizationService {
    repositories: AccessRepositories,
    cache: Arc<dyn PermissionCache>,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(repositories: AccessRepositories, cache: Arc<dyn PermissionCache>) -> Self {
        Self {
            repositories,
            cache,
        }
    }

    /// Resolves the effective permission set of one member.
    ///
    /// A member whose profile no longer exists gets `ProfileNotFound`, never
    /// a partial set.
    pub async fn resolve_permissions(
        &self,
        tenant_id: TenantId,
        user_id: &str,
    ) -> AccessResult<EffectivePermissionSet> {
        match self.cache.get(tenant_id, user_id).await {
            Ok(Some(permissions)) => return Ok(permissions),
            Ok(None) => {}
            Err(error) => {
                warn!(%tenant_id, user_id, %error, "permission cache read failed");
            }
        }

        let generation = match self.cache.generation(tenant_id).await {
            Ok(generation) => Some(generation),
            Err(error) => {
                warn!(%tenant_id, user_id, %error, "permission cache generation read failed");
                None
            }
        };

        let member = self.load_member(tenant_id, user_id).await?;
        let permissions = self.resolve_for_member(&member).await?;

        let Some(generation) = generation else {
            return Ok(permissions);
        };
        match self
            .cache
            .put(
                tenant_id,
                user_id,
                member.profile_id(),
                generation,
                permissions.clone(),
            )
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                debug!(%tenant_id, user_id, "resolved set outdated by an invalidation, not cached");
            }
            Err(error) => {
                warn!(%tenant_id, user_id, %error, "permission cache write failed");
            }
        }

        Ok(permissions)
    }

    /// Resolves another member's permissions on behalf of an administrator.
    pub async fn resolve_member_permissions(
        &self,
        actor: &UserIdentity,
        user_id: &str,
    ) -> AccessResult<EffectivePermissionSet> {
        if actor.user_id() != user_id {
            self.require_admin(actor).await?;
        }

        self.resolve_permissions(actor.tenant_id(), user_id).await
    }

    /// Resolves a member without consulting the cache.
    pub async fn resolve_for_member(&self, member: &Member) -> AccessResult<EffectivePermissionSet> {
        let profile = match member.profile_id() {
            Some(profile_id) => Some(self.load_profile(member.tenant_id(), profile_id).await?),
            None => None,
        };

        self.resolve_with(member.tenant_id(), member.job_role(), profile.as_ref())
            .await
    }

    /// Loads custom roles and overrides, then runs the resolver.
    pub(crate) async fn resolve_with(
        &self,
        tenant_id: TenantId,
        job_role: JobRole,
        profile: Option<&Profile>,
    ) -> AccessResult<EffectivePermissionSet> {
        let custom_roles = match profile {
            Some(profile) if !profile.custom_role_ids().is_empty() => {
                self.repositories
                    .custom_roles
                    .find_custom_roles(tenant_id, profile.custom_role_ids())
                    .await?
            }
            _ => Vec::new(),
        };
        let overrides = self
            .repositories
            .overrides
            .list_overrides(tenant_id, Some(job_role))
            .await?;

        Ok(resolve_permissions(ResolutionInput {
            job_role,
            profile,
            custom_roles: &custom_roles,
            overrides: &overrides,
        }))
    }

    /// Returns whether the actor may perform the action. Any failure denies.
    pub async fn check_access(
        &self,
        actor: &UserIdentity,
        resource: Resource,
        action: Action,
    ) -> bool {
        match self
            .resolve_permissions(actor.tenant_id(), actor.user_id())
            .await
        {
            Ok(permissions) => permissions.allows(resource, action),
            Err(error) => {
                warn!(
                    tenant_id = %actor.tenant_id(),
                    user_id = actor.user_id(),
                    %resource,
                    action = action.as_str(),
                    %error,
                    "access check failed closed"
                );
                false
            }
        }
    }

    /// Ensures the actor may perform the action.
    pub async fn require_access(
        &self,
        actor: &UserIdentity,
        resource: Resource,
        action: Action,
    ) -> AccessResult<()> {
        if self.check_access(actor, resource, action).await {
            return Ok(());
        }

        Err(AccessControlError::Forbidden(format!(
            "user '{}' may not {} '{resource}'",
            actor.user_id(),
            action.as_str()
        )))
    }

    /// Ensures the actor may administer access control in the workshop.
    pub async fn require_admin(&self, actor: &UserIdentity) -> AccessResult<()> {
        let permissions = match self
            .resolve_permissions(actor.tenant_id(), actor.user_id())
            .await
        {
            Ok(permissions) => permissions,
            Err(AccessControlError::Store(error)) => return Err(error.into()),
            Err(error) => {
                warn!(
                    tenant_id = %actor.tenant_id(),
                    user_id = actor.user_id(),
                    %error,
                    "administrative check failed closed"
                );
                return Err(not_admin(actor));
            }
        };

        if permissions.tier == Tier::Admin || permissions.has_system_role(ACCESS_MANAGE_ROLE) {
            return Ok(());
        }

        Err(not_admin(actor))
    }

    pub(crate) async fn load_member(
        &self,
        tenant_id: TenantId,
        user_id: &str,
    ) -> AccessResult<Member> {
        self.repositories
            .members
            .find_member(tenant_id, user_id)
            .await?
            .ok_or_else(|| AccessControlError::MemberNotFound {
                user_id: user_id.to_owned(),
            })
    }

    pub(crate) async fn load_profile(
        &self,
        tenant_id: TenantId,
        profile_id: ProfileId,
    ) -> AccessResult<Profile> {
        self.repositories
            .profiles
            .find_profile(tenant_id, profile_id)
            .await?
            .ok_or(AccessControlError::ProfileNotFound { profile_id })
    }
}

fn not_admin(actor: &UserIdentity) -> AccessControlError {
    AccessControlError::Forbidden(format!(
        "user '{}' lacks the '{ACCESS_MANAGE_ROLE}' capability in workshop '{}'",
        actor.user_id(),
        actor.tenant_id()
    ))
}

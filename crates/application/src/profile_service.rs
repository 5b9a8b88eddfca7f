use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use atelier_core::UserIdentity;
use atelier_domain::{
    AccessLevel, ActionFlags, AuditEntry, CustomRoleId, JobRole, ModuleId, NavItemId, Profile,
    ProfileId, ProfileKind, SystemRoleId, Tier,
};

use crate::cache_invalidation::{StaleScope, invalidate_after_commit};
use crate::{
    AccessControlError, AccessRepositories, AccessResult, AuthorizationService, PermissionCache,
};

mod lifecycle;
mod members;

/// Input payload for profile creation and cloning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateProfileInput {
    /// Display name, unique per workshop ignoring case.
    pub name: String,
    /// Audience; defaults to internal.
    pub kind: Option<ProfileKind>,
    /// Tier; defaults to the base profile's, then the seed role's, then viewer.
    pub tier: Option<Tier>,
    /// Job roles that auto-attach the profile on onboarding.
    pub job_roles: BTreeSet<JobRole>,
    /// Directly granted system roles, added to any cloned ones.
    pub system_role_ids: BTreeSet<SystemRoleId>,
    /// Referenced custom roles.
    pub custom_role_ids: BTreeSet<CustomRoleId>,
    /// Module levels written over the seeded map key by key.
    pub module_access: BTreeMap<ModuleId, AccessLevel>,
    /// Sidebar flags written over the seeded map key by key.
    pub sidebar_access: BTreeMap<NavItemId, ActionFlags>,
    /// Profile to deep-copy permissions from.
    pub base_profile_id: Option<ProfileId>,
    /// Job role whose defaults seed module access instead of all-blocked.
    pub seed_job_role: Option<JobRole>,
}

/// Partial update for a profile. Maps are replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    /// New name.
    pub name: Option<String>,
    /// New audience.
    pub kind: Option<ProfileKind>,
    /// New tier.
    pub tier: Option<Tier>,
    /// New auto-attach job roles.
    pub job_roles: Option<BTreeSet<JobRole>>,
    /// New direct system roles.
    pub system_role_ids: Option<BTreeSet<SystemRoleId>>,
    /// New custom role references.
    pub custom_role_ids: Option<BTreeSet<CustomRoleId>>,
    /// New module levels.
    pub module_access: Option<BTreeMap<ModuleId, AccessLevel>>,
    /// New sidebar flags.
    pub sidebar_access: Option<BTreeMap<NavItemId, ActionFlags>>,
    /// Justification recorded in the audit entries.
    pub reason: Option<String>,
}

/// Input payload for onboarding a workshop member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardMemberInput {
    /// Identity-provider user id.
    pub user_id: String,
    /// Display name.
    pub display_name: String,
    /// Contact email.
    pub email: Option<String>,
    /// Free-text job role label; unknown labels become "other".
    pub job_role: String,
}

/// Application service for the profile lifecycle and member assignment.
#[derive(Clone)]
pub struct ProfileService {
    authorization_service: AuthorizationService,
    repositories: AccessRepositories,
    cache: Arc<dyn PermissionCache>,
    max_write_attempts: u32,
}

impl ProfileService {
    /// Creates a new profile service. `max_write_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repositories: AccessRepositories,
        cache: Arc<dyn PermissionCache>,
        max_write_attempts: u32,
    ) -> Self {
        Self {
            authorization_service,
            repositories,
            cache,
            max_write_attempts: max_write_attempts.max(1),
        }
    }

    /// Lists the workshop's profiles ordered by name.
    pub async fn list_profiles(&self, actor: &UserIdentity) -> AccessResult<Vec<Profile>> {
        self.authorization_service.require_admin(actor).await?;
        Ok(self
            .repositories
            .profiles
            .list_profiles(actor.tenant_id())
            .await?)
    }

    /// Returns one profile.
    pub async fn get_profile(
        &self,
        actor: &UserIdentity,
        profile_id: ProfileId,
    ) -> AccessResult<Profile> {
        self.authorization_service.require_admin(actor).await?;
        self.authorization_service
            .load_profile(actor.tenant_id(), profile_id)
            .await
    }

    /// Returns a profile's audit history, oldest first.
    pub async fn profile_audit_log(
        &self,
        actor: &UserIdentity,
        profile_id: ProfileId,
    ) -> AccessResult<Vec<AuditEntry>> {
        Ok(self.get_profile(actor, profile_id).await?.audit_log().to_vec())
    }

    async fn ensure_unique_name(
        &self,
        actor: &UserIdentity,
        name: &str,
        except: Option<ProfileId>,
    ) -> AccessResult<()> {
        let profiles = self
            .repositories
            .profiles
            .list_profiles(actor.tenant_id())
            .await?;

        if profiles
            .iter()
            .any(|profile| Some(profile.id()) != except && profile.name().eq_ignore_case(name))
        {
            return Err(AccessControlError::DuplicateName {
                name: name.trim().to_owned(),
            });
        }

        Ok(())
    }

    async fn ensure_custom_roles_exist(
        &self,
        actor: &UserIdentity,
        custom_role_ids: &BTreeSet<CustomRoleId>,
    ) -> AccessResult<()> {
        if custom_role_ids.is_empty() {
            return Ok(());
        }

        let found: BTreeSet<CustomRoleId> = self
            .repositories
            .custom_roles
            .find_custom_roles(actor.tenant_id(), custom_role_ids)
            .await?
            .iter()
            .map(|custom_role| custom_role.id())
            .collect();

        match custom_role_ids.difference(&found).next() {
            Some(missing) => Err(AccessControlError::CustomRoleNotFound {
                custom_role_id: *missing,
            }),
            None => Ok(()),
        }
    }
}

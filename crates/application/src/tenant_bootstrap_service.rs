use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use atelier_core::{TenantId, UserIdentity};
use atelier_domain::{
    ACCESS_MANAGE_ROLE, EmailAddress, JobRole, JobRoleDefaults, Member, Profile, ProfileId,
    ProfileKind, ProfileParts, SystemRoleId, Tier, blocked_module_access,
};
use chrono::Utc;
use tracing::info;

use crate::cache_invalidation::{StaleScope, invalidate_after_commit};
use crate::{AccessControlError, AccessRepositories, AccessResult, PermissionCache};

/// Name of the platform-managed administrator profile.
pub const ADMINISTRATOR_PROFILE_NAME: &str = "Administrator";

/// Seeds the default profiles of a workshop and registers its first owner.
#[derive(Clone)]
pub struct TenantBootstrapService {
    repositories: AccessRepositories,
    cache: Arc<dyn PermissionCache>,
}

impl TenantBootstrapService {
    /// Creates a new bootstrap service.
    #[must_use]
    pub fn new(repositories: AccessRepositories, cache: Arc<dyn PermissionCache>) -> Self {
        Self {
            repositories,
            cache,
        }
    }

    /// Creates the administrator profile and one profile per job role.
    ///
    /// Profiles whose name already exists are left alone, so running this
    /// twice creates nothing the second time. Returns the created profiles.
    pub async fn seed_default_profiles(&self, tenant_id: TenantId) -> AccessResult<Vec<Profile>> {
        let existing = self.repositories.profiles.list_profiles(tenant_id).await?;
        let exists = |name: &str| {
            existing
                .iter()
                .any(|profile| profile.name().eq_ignore_case(name))
        };

        let mut seeds = vec![administrator_parts(tenant_id)?];
        seeds.extend(JobRole::all().iter().map(|job_role| job_role_parts(tenant_id, *job_role)));

        let mut created = Vec::new();
        for parts in seeds {
            if exists(&parts.name) {
                continue;
            }
            let profile = Profile::from_parts(parts)?;
            created.push(self.repositories.profiles.insert_profile(profile).await?);
        }

        info!(%tenant_id, created = created.len(), "default profiles seeded");
        Ok(created)
    }

    /// Makes the caller the workshop's first administrator.
    ///
    /// Allowed only while the workshop has no members at all; repeating the
    /// call as that owner returns the existing membership. Anyone who is
    /// already a member, or arrives after the first member, is refused.
    pub async fn bootstrap_owner(&self, owner: &UserIdentity) -> AccessResult<Member> {
        let tenant_id = owner.tenant_id();
        self.seed_default_profiles(tenant_id).await?;

        let administrator = self
            .repositories
            .profiles
            .list_profiles(tenant_id)
            .await?
            .into_iter()
            .find(|profile| {
                profile.is_system() && profile.name().eq_ignore_case(ADMINISTRATOR_PROFILE_NAME)
            })
            .ok_or_else(|| {
                AccessControlError::Validation(format!(
                    "workshop has no '{ADMINISTRATOR_PROFILE_NAME}' system profile"
                ))
            })?;

        if let Some(member) = self
            .repositories
            .members
            .find_member(tenant_id, owner.user_id())
            .await?
        {
            if member.profile_id() == Some(administrator.id()) {
                return Ok(member);
            }
            return Err(already_bootstrapped());
        }

        let member = Member::new(
            owner.user_id(),
            tenant_id,
            owner.display_name(),
            owner.email().map(EmailAddress::new).transpose()?,
            JobRole::Director,
            Some(administrator.id()),
        )?;
        if !self
            .repositories
            .members
            .insert_first_member(member.clone())
            .await?
        {
            return Err(already_bootstrapped());
        }
        invalidate_after_commit(
            self.cache.as_ref(),
            tenant_id,
            StaleScope::Member(owner.user_id()),
        )
        .await;
        info!(%tenant_id, user_id = owner.user_id(), "workshop owner registered");

        Ok(member)
    }
}

fn already_bootstrapped() -> AccessControlError {
    AccessControlError::Forbidden("workshop already has members; ask an administrator".to_owned())
}

fn administrator_parts(tenant_id: TenantId) -> AccessResult<ProfileParts> {
    let mut system_role_ids = BTreeSet::new();
    system_role_ids.insert(SystemRoleId::new(ACCESS_MANAGE_ROLE)?);

    let mut parts = empty_parts(tenant_id, ADMINISTRATOR_PROFILE_NAME, Tier::Admin);
    parts.kind = ProfileKind::System;
    parts.is_system = true;
    parts.job_roles = BTreeSet::from([JobRole::Director]);
    parts.system_role_ids = system_role_ids;
    parts.module_access = JobRoleDefaults::for_job_role(JobRole::Director)
        .module_access()
        .clone();
    Ok(parts)
}

fn job_role_parts(tenant_id: TenantId, job_role: JobRole) -> ProfileParts {
    let defaults = JobRoleDefaults::for_job_role(job_role);
    let mut parts = empty_parts(tenant_id, profile_label(job_role), defaults.tier());
    parts.job_roles = BTreeSet::from([job_role]);
    parts.module_access = defaults.module_access().clone();
    parts
}

fn empty_parts(tenant_id: TenantId, name: &str, tier: Tier) -> ProfileParts {
    ProfileParts {
        id: ProfileId::new(),
        tenant_id,
        name: name.to_owned(),
        kind: ProfileKind::Internal,
        tier,
        job_roles: BTreeSet::new(),
        system_role_ids: BTreeSet::new(),
        custom_role_ids: BTreeSet::new(),
        module_access: blocked_module_access(),
        sidebar_access: BTreeMap::new(),
        is_system: false,
        cloned_from: None,
        audit_log: Vec::new(),
        version: 0,
        updated_at: Utc::now(),
    }
}

fn profile_label(job_role: JobRole) -> &'static str {
    match job_role {
        JobRole::Director => "Director",
        JobRole::Manager => "Manager",
        JobRole::ServiceAdvisor => "Service Advisor",
        JobRole::Technician => "Technician",
        JobRole::Financial => "Financial",
        JobRole::Commercial => "Commercial",
        JobRole::Marketing => "Marketing",
        JobRole::HumanResources => "Human Resources",
        JobRole::Other => "Other",
    }
}

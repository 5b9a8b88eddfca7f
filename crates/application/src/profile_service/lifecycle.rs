use super::*;

use atelier_core::NonEmptyString;
use atelier_domain::{AuditAction, JobRoleDefaults, ProfileParts, blocked_module_access};
use chrono::Utc;
use tracing::{debug, info};

use crate::ProfileWrite;
use crate::audit_trail::{AuditContext, normalize_reason};

impl ProfileService {
    /// Creates a profile, optionally cloned from a base profile.
    ///
    /// Module access starts all-blocked unless a base profile or a seed job
    /// role is given; the input maps are then written over it key by key.
    pub async fn create_profile(
        &self,
        actor: &UserIdentity,
        input: CreateProfileInput,
    ) -> AccessResult<Profile> {
        self.authorization_service.require_admin(actor).await?;

        let name = profile_name(&input.name)?;
        if input.kind == Some(ProfileKind::System) {
            return Err(AccessControlError::Validation(
                "system profiles are managed by the platform".to_owned(),
            ));
        }
        self.ensure_unique_name(actor, name.as_str(), None).await?;
        self.ensure_custom_roles_exist(actor, &input.custom_role_ids)
            .await?;

        let tenant_id = actor.tenant_id();
        let base = match input.base_profile_id {
            Some(base_profile_id) => Some(
                self.authorization_service
                    .load_profile(tenant_id, base_profile_id)
                    .await?,
            ),
            None => None,
        };
        let seed = input.seed_job_role.map(JobRoleDefaults::for_job_role);

        let mut module_access = match (&base, &seed) {
            (Some(base), _) => base.module_access().clone(),
            (None, Some(seed)) => seed.module_access().clone(),
            (None, None) => blocked_module_access(),
        };
        module_access.extend(input.module_access);

        let mut sidebar_access = base
            .as_ref()
            .map(|base| base.sidebar_access().clone())
            .unwrap_or_default();
        sidebar_access.extend(input.sidebar_access);

        let mut system_role_ids = base
            .as_ref()
            .map(|base| base.system_role_ids().clone())
            .unwrap_or_default();
        system_role_ids.extend(input.system_role_ids);

        let tier = input
            .tier
            .or_else(|| base.as_ref().map(Profile::tier))
            .or_else(|| seed.as_ref().map(JobRoleDefaults::tier))
            .unwrap_or(Tier::Viewer);

        let profile = Profile::from_parts(ProfileParts {
            id: ProfileId::new(),
            tenant_id,
            name: name.into(),
            kind: input.kind.unwrap_or(ProfileKind::Internal),
            tier,
            job_roles: input.job_roles,
            system_role_ids,
            custom_role_ids: input.custom_role_ids,
            module_access,
            sidebar_access,
            is_system: false,
            cloned_from: base.as_ref().map(Profile::id),
            audit_log: Vec::new(),
            version: 0,
            updated_at: Utc::now(),
        })?;

        let created = self.repositories.profiles.insert_profile(profile).await?;
        info!(
            %tenant_id,
            profile_id = %created.id(),
            cloned_from = ?created.cloned_from(),
            actor = actor.user_id(),
            "permission profile created"
        );

        Ok(created)
    }

    /// Creates a deep copy of `base_profile_id` with `input` applied on top.
    pub async fn clone_profile(
        &self,
        actor: &UserIdentity,
        base_profile_id: ProfileId,
        input: CreateProfileInput,
    ) -> AccessResult<Profile> {
        self.create_profile(
            actor,
            CreateProfileInput {
                base_profile_id: Some(base_profile_id),
                ..input
            },
        )
        .await
    }

    /// Applies a patch, appending one audit entry per changed field.
    ///
    /// Name and kind of system profiles are immutable; their permission
    /// fields may still change.
    pub async fn update_profile(
        &self,
        actor: &UserIdentity,
        profile_id: ProfileId,
        patch: ProfilePatch,
    ) -> AccessResult<Profile> {
        self.authorization_service.require_admin(actor).await?;

        let name = patch.name.as_deref().map(profile_name).transpose()?;
        if let Some(name) = &name {
            self.ensure_unique_name(actor, name.as_str(), Some(profile_id))
                .await?;
        }
        if let Some(custom_role_ids) = &patch.custom_role_ids {
            self.ensure_custom_roles_exist(actor, custom_role_ids)
                .await?;
        }

        let tenant_id = actor.tenant_id();
        let affected_users_count = self
            .repositories
            .members
            .count_members_with_profile(tenant_id, profile_id)
            .await?;
        let audit = AuditContext::new(
            actor,
            normalize_reason(patch.reason.as_deref()),
            affected_users_count,
        );

        for attempt in 1..=self.max_write_attempts {
            let mut profile = self
                .authorization_service
                .load_profile(tenant_id, profile_id)
                .await?;

            if profile.is_system() {
                let renamed = name.as_ref().is_some_and(|name| name != profile.name());
                let rekinded = patch.kind.is_some_and(|kind| kind != profile.kind());
                if renamed || rekinded {
                    return Err(AccessControlError::SystemProfileImmutable {
                        name: profile.name().to_string(),
                    });
                }
            } else if patch.kind == Some(ProfileKind::System) {
                return Err(AccessControlError::Validation(
                    "system profiles are managed by the platform".to_owned(),
                ));
            }

            if !apply_patch(&mut profile, &patch, name.as_ref(), &audit)? {
                return Ok(profile);
            }

            match self.repositories.profiles.update_profile(profile).await? {
                ProfileWrite::Written(updated) => {
                    invalidate_after_commit(
                        self.cache.as_ref(),
                        tenant_id,
                        StaleScope::Profile(profile_id),
                    )
                    .await;
                    info!(
                        %tenant_id,
                        %profile_id,
                        version = updated.version(),
                        actor = actor.user_id(),
                        "permission profile updated"
                    );
                    return Ok(updated);
                }
                ProfileWrite::Stale => {
                    debug!(%tenant_id, %profile_id, attempt, "profile changed concurrently; retrying");
                }
            }
        }

        Err(AccessControlError::ConcurrentModification {
            profile_id,
            attempts: self.max_write_attempts,
        })
    }

    /// Deletes an unused, non-system profile.
    pub async fn delete_profile(
        &self,
        actor: &UserIdentity,
        profile_id: ProfileId,
    ) -> AccessResult<()> {
        self.authorization_service.require_admin(actor).await?;

        let tenant_id = actor.tenant_id();
        let profile = self
            .authorization_service
            .load_profile(tenant_id, profile_id)
            .await?;
        if profile.is_system() {
            return Err(AccessControlError::SystemProfileImmutable {
                name: profile.name().to_string(),
            });
        }

        let member_count = self
            .repositories
            .members
            .count_members_with_profile(tenant_id, profile_id)
            .await?;
        if member_count > 0 {
            return Err(AccessControlError::ProfileInUse {
                name: profile.name().to_string(),
                member_count,
            });
        }

        self.repositories
            .profiles
            .delete_profile(tenant_id, profile_id)
            .await?;
        invalidate_after_commit(
            self.cache.as_ref(),
            tenant_id,
            StaleScope::Profile(profile_id),
        )
        .await;
        info!(%tenant_id, %profile_id, actor = actor.user_id(), "permission profile deleted");

        Ok(())
    }
}

fn profile_name(value: &str) -> AccessResult<NonEmptyString> {
    NonEmptyString::new(value)
        .map_err(|_| AccessControlError::Validation("profile name must not be empty".to_owned()))
}

/// Applies the patch in place and reports whether anything changed.
fn apply_patch(
    profile: &mut Profile,
    patch: &ProfilePatch,
    name: Option<&NonEmptyString>,
    audit: &AuditContext<'_>,
) -> AccessResult<bool> {
    let updated = AuditAction::ProfileUpdated;
    let mut entries = Vec::new();

    if let Some(name) = name.filter(|name| *name != profile.name()) {
        entries.push(audit.entry(updated, "name", &profile.name().as_str(), &name.as_str())?);
        profile.rename(name.clone());
    }
    if let Some(kind) = patch.kind.filter(|kind| *kind != profile.kind()) {
        entries.push(audit.entry(updated, "kind", &profile.kind(), &kind)?);
        profile.set_kind(kind);
    }
    if let Some(tier) = patch.tier.filter(|tier| *tier != profile.tier()) {
        entries.push(audit.entry(updated, "tier", &profile.tier(), &tier)?);
        profile.set_tier(tier);
    }
    if let Some(job_roles) = patch
        .job_roles
        .as_ref()
        .filter(|job_roles| *job_roles != profile.job_roles())
    {
        entries.push(audit.entry(updated, "job_roles", profile.job_roles(), job_roles)?);
        profile.set_job_roles(job_roles.clone());
    }
    if let Some(system_role_ids) = patch
        .system_role_ids
        .as_ref()
        .filter(|system_role_ids| *system_role_ids != profile.system_role_ids())
    {
        entries.push(audit.entry(
            updated,
            "system_role_ids",
            profile.system_role_ids(),
            system_role_ids,
        )?);
        profile.set_system_role_ids(system_role_ids.clone());
    }
    if let Some(custom_role_ids) = patch
        .custom_role_ids
        .as_ref()
        .filter(|custom_role_ids| *custom_role_ids != profile.custom_role_ids())
    {
        entries.push(audit.entry(
            updated,
            "custom_role_ids",
            profile.custom_role_ids(),
            custom_role_ids,
        )?);
        profile.set_custom_role_ids(custom_role_ids.clone());
    }
    if let Some(module_access) = &patch.module_access {
        let mut filled = blocked_module_access();
        filled.extend(module_access.iter().map(|(module, level)| (*module, *level)));
        if &filled != profile.module_access() {
            entries.push(audit.entry(updated, "module_access", profile.module_access(), &filled)?);
            profile.set_module_access(filled);
        }
    }
    if let Some(sidebar_access) = patch
        .sidebar_access
        .as_ref()
        .filter(|sidebar_access| *sidebar_access != profile.sidebar_access())
    {
        entries.push(audit.entry(
            updated,
            "sidebar_access",
            profile.sidebar_access(),
            sidebar_access,
        )?);
        profile.set_sidebar_access(sidebar_access.clone());
    }

    let changed = !entries.is_empty();
    for entry in entries {
        profile.record_audit(entry);
    }

    Ok(changed)
}

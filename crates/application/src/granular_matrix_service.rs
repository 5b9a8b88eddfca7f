//! Tenant-wide override table administration.
//!
//! Editors work on snapshots: read the table, compute a diff against the
//! desired state with [`diff_overrides`], then submit the diff. Previews run
//! the same resolver that enforces access.

use std::collections::BTreeMap;
use std::sync::Arc;

use atelier_core::UserIdentity;
use atelier_domain::{
    Action, EffectivePermissionSet, GranularOverride, JobRole, ProfileId, Resource,
};
use tracing::{info, warn};

use crate::cache_invalidation::{StaleScope, invalidate_after_commit};
use crate::permission_resolver::{ResolutionInput, resolve_permissions};
use crate::{
    AccessControlError, AccessRepositories, AccessResult, AuthorizationService, PermissionCache,
};

/// One step of an override diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideChange {
    /// Store this override, replacing any entry with the same key.
    Set(GranularOverride),
    /// Remove the entry for this key.
    Remove {
        /// Overridden resource.
        resource: Resource,
        /// Job role the entry applies to.
        job_role: JobRole,
    },
}

/// What to preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRequest {
    /// Job role whose defaults and overrides apply.
    pub job_role: JobRole,
    /// Profile layered over the defaults, if any.
    pub profile_id: Option<ProfileId>,
    /// Unsaved overrides to preview instead of the stored table.
    pub draft: Option<Vec<GranularOverride>>,
}

/// Application service for the granular override matrix.
#[derive(Clone)]
pub struct GranularMatrixService {
    authorization_service: AuthorizationService,
    repositories: AccessRepositories,
    cache: Arc<dyn PermissionCache>,
}

impl GranularMatrixService {
    /// Creates a new matrix service.
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

    /// Lists overrides, optionally for one job role.
    pub async fn list_overrides(
        &self,
        actor: &UserIdentity,
        job_role: Option<JobRole>,
    ) -> AccessResult<Vec<GranularOverride>> {
        self.authorization_service.require_admin(actor).await?;
        Ok(self
            .repositories
            .overrides
            .list_overrides(actor.tenant_id(), job_role)
            .await?)
    }

    /// Replaces the action map stored for `(resource, job_role)`.
    pub async fn set_override(
        &self,
        actor: &UserIdentity,
        resource: Resource,
        job_role: JobRole,
        actions: BTreeMap<Action, bool>,
    ) -> AccessResult<GranularOverride> {
        self.authorization_service.require_admin(actor).await?;

        let granular_override = GranularOverride::new(actor.tenant_id(), resource, job_role, actions)
            .map_err(|error| AccessControlError::Validation(error.to_string()))?;
        self.repositories
            .overrides
            .save_override(granular_override.clone())
            .await?;
        invalidate_after_commit(self.cache.as_ref(), actor.tenant_id(), StaleScope::Tenant).await;
        info!(
            tenant_id = %actor.tenant_id(),
            %resource,
            job_role = job_role.as_str(),
            "granular override set"
        );

        Ok(granular_override)
    }

    /// Removes the entry for `(resource, job_role)`; returns whether it existed.
    pub async fn delete_override(
        &self,
        actor: &UserIdentity,
        resource: Resource,
        job_role: JobRole,
    ) -> AccessResult<bool> {
        self.authorization_service.require_admin(actor).await?;

        let removed = self
            .repositories
            .overrides
            .delete_override(actor.tenant_id(), resource, job_role)
            .await?;
        if removed {
            invalidate_after_commit(self.cache.as_ref(), actor.tenant_id(), StaleScope::Tenant)
                .await;
            info!(
                tenant_id = %actor.tenant_id(),
                %resource,
                job_role = job_role.as_str(),
                "granular override removed"
            );
        }

        Ok(removed)
    }

    /// Resolves what a member with the given job role and profile would get.
    /// Nothing is stored.
    pub async fn preview(
        &self,
        actor: &UserIdentity,
        request: PreviewRequest,
    ) -> AccessResult<EffectivePermissionSet> {
        self.authorization_service.require_admin(actor).await?;

        let tenant_id = actor.tenant_id();
        let profile = match request.profile_id {
            Some(profile_id) => Some(
                self.authorization_service
                    .load_profile(tenant_id, profile_id)
                    .await?,
            ),
            None => None,
        };

        let Some(draft) = request.draft else {
            return self
                .authorization_service
                .resolve_with(tenant_id, request.job_role, profile.as_ref())
                .await;
        };

        let custom_roles = match &profile {
            Some(profile) if !profile.custom_role_ids().is_empty() => {
                self.repositories
                    .custom_roles
                    .find_custom_roles(tenant_id, profile.custom_role_ids())
                    .await?
            }
            _ => Vec::new(),
        };

        Ok(resolve_permissions(ResolutionInput {
            job_role: request.job_role,
            profile: profile.as_ref(),
            custom_roles: &custom_roles,
            overrides: &draft,
        }))
    }

    /// Applies a diff in order; returns how many changes were written.
    ///
    /// Changes are written one by one. When one fails, the earlier ones stay
    /// applied and the error reports how far the diff got.
    pub async fn apply_override_changes(
        &self,
        actor: &UserIdentity,
        changes: Vec<OverrideChange>,
    ) -> AccessResult<usize> {
        self.authorization_service.require_admin(actor).await?;

        let tenant_id = actor.tenant_id();
        if changes.iter().any(|change| {
            matches!(change, OverrideChange::Set(granular_override) if granular_override.tenant_id() != tenant_id)
        }) {
            return Err(AccessControlError::Validation(
                "overrides must belong to the caller's workshop".to_owned(),
            ));
        }

        let total = changes.len();
        let mut applied = 0;
        let mut failure = None;
        for change in changes {
            let written = match change {
                OverrideChange::Set(granular_override) => {
                    self.repositories
                        .overrides
                        .save_override(granular_override)
                        .await
                }
                OverrideChange::Remove { resource, job_role } => self
                    .repositories
                    .overrides
                    .delete_override(tenant_id, resource, job_role)
                    .await
                    .map(|_| ()),
            };
            if let Err(error) = written {
                failure = Some(error);
                break;
            }
            applied += 1;
        }

        if applied > 0 {
            invalidate_after_commit(self.cache.as_ref(), tenant_id, StaleScope::Tenant).await;
        }
        if let Some(source) = failure {
            warn!(%tenant_id, applied, total, %source, "granular override diff interrupted");
            return Err(AccessControlError::OverrideDiffInterrupted {
                applied,
                total,
                source,
            });
        }
        info!(%tenant_id, applied, "granular override diff applied");

        Ok(applied)
    }
}

/// Computes the changes that turn `snapshot` into `desired`.
///
/// Keys are `(job_role, resource)`; unchanged entries produce nothing. The
/// result is ordered by key, removals and sets interleaved.
#[must_use]
pub fn diff_overrides(
    snapshot: &[GranularOverride],
    desired: &[GranularOverride],
) -> Vec<OverrideChange> {
    let keyed = |overrides: &[GranularOverride]| {
        overrides
            .iter()
            .map(|entry| ((entry.job_role(), entry.resource()), entry.clone()))
            .collect::<BTreeMap<_, _>>()
    };
    let before = keyed(snapshot);
    let after = keyed(desired);

    let mut keys: Vec<(JobRole, Resource)> = before.keys().chain(after.keys()).copied().collect();
    keys.sort();
    keys.dedup();

    keys.into_iter()
        .filter_map(|key| match (before.get(&key), after.get(&key)) {
            (Some(old), Some(new)) if old.actions() == new.actions() => None,
            (_, Some(new)) => Some(OverrideChange::Set(new.clone())),
            (Some(_), None) => Some(OverrideChange::Remove {
                resource: key.1,
                job_role: key.0,
            }),
            (None, None) => None,
        })
        .collect()
}

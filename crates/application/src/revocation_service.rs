//! Revocation and grant workflow over a profile's direct system roles.
//!
//! Each request walks `Requested -> Validated -> Applied -> Logged ->
//! Notified`, or ends in `Rejected`. The profile write and its audit entry
//! are one optimistic write, retried when another writer got there first.
//! Delivery of the notice and the cache refresh are advisory: failure leaves
//! the change in place and comes back as a warning.

use std::collections::BTreeSet;
use std::sync::Arc;

use atelier_core::{TenantId, UserIdentity};
use atelier_domain::{AuditAction, AuditEntry, CustomRole, ProfileId, SystemRoleId};
use tracing::{debug, info, warn};

use crate::audit_trail::{AuditContext, normalize_reason};
use crate::cache_invalidation::{StaleScope, invalidate_after_commit};
use crate::{
    AccessControlError, AccessRepositories, AccessResult, AuthorizationService,
    CustomRoleConflict, Notification, NotificationSender, PermissionCache, ProfileWrite,
};

/// Workflow stage of one permission change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationStage {
    /// Request received.
    Requested,
    /// Selection checked against the member's current grants.
    Validated,
    /// Profile system roles changed.
    Applied,
    /// Audit entry persisted with the change.
    Logged,
    /// Affected member notified.
    Notified,
    /// Request refused; nothing was applied.
    Rejected,
}

impl RevocationStage {
    /// Returns a stable label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Validated => "validated",
            Self::Applied => "applied",
            Self::Logged => "logged",
            Self::Notified => "notified",
            Self::Rejected => "rejected",
        }
    }
}

/// Direction of a permission change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionChange {
    /// Remove direct system roles.
    Revoke,
    /// Add direct system roles.
    Grant,
}

impl PermissionChange {
    /// Returns a stable label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revoke => "revoke",
            Self::Grant => "grant",
        }
    }

    fn audit_action(self) -> AuditAction {
        match self {
            Self::Revoke => AuditAction::RevokePermissions,
            Self::Grant => AuditAction::GrantPermissions,
        }
    }
}

/// Input for a revoke or grant request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionChangeRequest {
    /// Member whose profile is changed.
    pub user_id: String,
    /// Selected system roles; must not be empty.
    pub permissions: BTreeSet<SystemRoleId>,
    /// Free-text justification; must not be blank.
    pub reason: String,
}

/// Outcome of a successful revoke or grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationResult {
    /// Direction of the change.
    pub change: PermissionChange,
    /// Changed profile.
    pub profile_id: ProfileId,
    /// Member the request targeted.
    pub user_id: String,
    /// System roles removed or added.
    pub changed: BTreeSet<SystemRoleId>,
    /// Direct system roles after the change.
    pub system_role_ids: BTreeSet<SystemRoleId>,
    /// Audit entry written with the change.
    pub audit_entry: AuditEntry,
    /// Final stage: `Notified`, or `Logged` when delivery failed.
    pub stage: RevocationStage,
    /// Delivery failure, if any.
    pub notification_warning: Option<String>,
    /// Cache refresh failure after the change was saved, if any.
    pub cache_warning: Option<String>,
    /// Write attempts used.
    pub attempts: u32,
}

/// Application service for revoking and granting direct system roles.
#[derive(Clone)]
pub struct RevocationService {
    authorization_service: AuthorizationService,
    repositories: AccessRepositories,
    cache: Arc<dyn PermissionCache>,
    notification_sender: Arc<dyn NotificationSender>,
    max_write_attempts: u32,
}

struct StageTracker<'a> {
    tenant_id: TenantId,
    user_id: &'a str,
    change: PermissionChange,
    stage: RevocationStage,
}

impl StageTracker<'_> {
    fn advance(&mut self, stage: RevocationStage) {
        info!(
            tenant_id = %self.tenant_id,
            user_id = self.user_id,
            change = self.change.as_str(),
            from = self.stage.as_str(),
            to = stage.as_str(),
            "permission change stage"
        );
        self.stage = stage;
    }

    fn reject(&mut self, error: AccessControlError) -> AccessControlError {
        warn!(
            tenant_id = %self.tenant_id,
            user_id = self.user_id,
            change = self.change.as_str(),
            from = self.stage.as_str(),
            %error,
            "permission change rejected"
        );
        self.stage = RevocationStage::Rejected;
        error
    }
}

impl RevocationService {
    /// Creates a new revocation service. `max_write_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repositories: AccessRepositories,
        cache: Arc<dyn PermissionCache>,
        notification_sender: Arc<dyn NotificationSender>,
        max_write_attempts: u32,
    ) -> Self {
        Self {
            authorization_service,
            repositories,
            cache,
            notification_sender,
            max_write_attempts: max_write_attempts.max(1),
        }
    }

    /// Removes directly granted system roles from the member's profile.
    ///
    /// Every selected role must be held by the member. Roles that reach the
    /// member through a custom role are refused as a whole, listing every
    /// granting custom role, so the operator edits the association instead.
    pub async fn revoke_permissions(
        &self,
        actor: &UserIdentity,
        request: PermissionChangeRequest,
    ) -> AccessResult<RevocationResult> {
        self.change_permissions(actor, request, PermissionChange::Revoke)
            .await
    }

    /// Adds system roles to the member's profile. Roles already held
    /// directly are refused.
    pub async fn grant_permissions(
        &self,
        actor: &UserIdentity,
        request: PermissionChangeRequest,
    ) -> AccessResult<RevocationResult> {
        self.change_permissions(actor, request, PermissionChange::Grant)
            .await
    }

    async fn change_permissions(
        &self,
        actor: &UserIdentity,
        request: PermissionChangeRequest,
        change: PermissionChange,
    ) -> AccessResult<RevocationResult> {
        self.authorization_service.require_admin(actor).await?;

        let tenant_id = actor.tenant_id();
        let mut tracker = StageTracker {
            tenant_id,
            user_id: request.user_id.as_str(),
            change,
            stage: RevocationStage::Requested,
        };
        info!(
            %tenant_id,
            user_id = tracker.user_id,
            change = change.as_str(),
            actor = actor.user_id(),
            permissions = request.permissions.len(),
            "permission change requested"
        );

        let Some(reason) = normalize_reason(Some(request.reason.as_str())) else {
            return Err(tracker.reject(AccessControlError::Validation(
                "a reason is required to change permissions".to_owned(),
            )));
        };
        if request.permissions.is_empty() {
            return Err(tracker.reject(AccessControlError::Validation(
                "select at least one permission".to_owned(),
            )));
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            let (mut profile, custom_roles) = self
                .load_target(tenant_id, &request.user_id)
                .await
                .map_err(|error| tracker.reject(error))?;
            let profile_id = profile.id();
            let current = profile.system_role_ids().clone();

            let next = match change {
                PermissionChange::Revoke => {
                    validate_revocation(&request.permissions, &current, &custom_roles)
                }
                PermissionChange::Grant => validate_grant(&request.permissions, &current),
            }
            .map_err(|error| tracker.reject(error))?;
            if attempt == 1 {
                tracker.advance(RevocationStage::Validated);
            }

            let affected_users_count = self
                .repositories
                .members
                .count_members_with_profile(tenant_id, profile_id)
                .await
                .map_err(|error| tracker.reject(error.into()))?;
            let audit_entry = AuditContext::new(actor, Some(reason.clone()), affected_users_count)
                .entry(change.audit_action(), "system_role_ids", &current, &next)
                .map_err(|error| tracker.reject(error))?;

            profile.set_system_role_ids(next.clone());
            profile.record_audit(audit_entry.clone());

            match self
                .repositories
                .profiles
                .update_profile(profile)
                .await
                .map_err(|error| tracker.reject(error.into()))?
            {
                ProfileWrite::Written(_) => {
                    tracker.advance(RevocationStage::Applied);
                    tracker.advance(RevocationStage::Logged);
                    return self
                        .finish(
                            &mut tracker,
                            &request,
                            profile_id,
                            next,
                            audit_entry,
                            attempt,
                        )
                        .await;
                }
                ProfileWrite::Stale if attempt >= self.max_write_attempts => {
                    return Err(tracker.reject(AccessControlError::ConcurrentModification {
                        profile_id,
                        attempts: attempt,
                    }));
                }
                ProfileWrite::Stale => {
                    debug!(%tenant_id, %profile_id, attempt, "profile changed concurrently; retrying");
                }
            }
        }
    }

    async fn load_target(
        &self,
        tenant_id: TenantId,
        user_id: &str,
    ) -> AccessResult<(atelier_domain::Profile, Vec<CustomRole>)> {
        let member = self
            .authorization_service
            .load_member(tenant_id, user_id)
            .await?;
        let profile_id =
            member
                .profile_id()
                .ok_or_else(|| AccessControlError::NoProfileAssigned {
                    user_id: user_id.to_owned(),
                })?;
        let profile = self
            .authorization_service
            .load_profile(tenant_id, profile_id)
            .await?;

        let mut custom_roles = if profile.custom_role_ids().is_empty() {
            Vec::new()
        } else {
            self.repositories
                .custom_roles
                .find_custom_roles(tenant_id, profile.custom_role_ids())
                .await?
        };
        custom_roles.sort_by_cached_key(|custom_role| custom_role.name().as_str().to_lowercase());

        Ok((profile, custom_roles))
    }

    async fn finish(
        &self,
        tracker: &mut StageTracker<'_>,
        request: &PermissionChangeRequest,
        profile_id: ProfileId,
        system_role_ids: BTreeSet<SystemRoleId>,
        audit_entry: AuditEntry,
        attempts: u32,
    ) -> AccessResult<RevocationResult> {
        let tenant_id = tracker.tenant_id;
        let cache_warning = invalidate_after_commit(
            self.cache.as_ref(),
            tenant_id,
            StaleScope::Profile(profile_id),
        )
        .await;

        let notification = self.notification(tracker, request).await;
        let notification_warning = match self.notification_sender.notify(notification).await {
            Ok(()) => {
                tracker.advance(RevocationStage::Notified);
                None
            }
            Err(error) => {
                warn!(
                    %tenant_id,
                    user_id = tracker.user_id,
                    %error,
                    "permission change applied but notification failed"
                );
                Some(format!(
                    "permissions were changed, but the member could not be notified: {error}"
                ))
            }
        };

        Ok(RevocationResult {
            change: tracker.change,
            profile_id,
            user_id: request.user_id.clone(),
            changed: request.permissions.clone(),
            system_role_ids,
            audit_entry,
            stage: tracker.stage,
            notification_warning,
            cache_warning,
            attempts,
        })
    }

    async fn notification(
        &self,
        tracker: &StageTracker<'_>,
        request: &PermissionChangeRequest,
    ) -> Notification {
        let email = match self
            .repositories
            .members
            .find_member(tracker.tenant_id, &request.user_id)
            .await
        {
            Ok(member) => member.and_then(|member| member.email().map(|email| email.as_str().to_owned())),
            Err(error) => {
                warn!(tenant_id = %tracker.tenant_id, user_id = tracker.user_id, %error, "could not load member email");
                None
            }
        };

        let permissions = request
            .permissions
            .iter()
            .map(SystemRoleId::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let (subject, body) = match tracker.change {
            PermissionChange::Revoke => (
                "Your workshop access was reduced",
                format!("The following permissions were removed from your access: {permissions}."),
            ),
            PermissionChange::Grant => (
                "Your workshop access was extended",
                format!("The following permissions were added to your access: {permissions}."),
            ),
        };

        Notification {
            tenant_id: tracker.tenant_id,
            user_id: request.user_id.clone(),
            email,
            subject: subject.to_owned(),
            body,
        }
    }
}

/// Returns the direct roles left after revoking `selected`.
fn validate_revocation(
    selected: &BTreeSet<SystemRoleId>,
    direct: &BTreeSet<SystemRoleId>,
    custom_roles: &[CustomRole],
) -> AccessResult<BTreeSet<SystemRoleId>> {
    let missing: Vec<SystemRoleId> = selected
        .iter()
        .filter(|permission| {
            !direct.contains(*permission)
                && !custom_roles
                    .iter()
                    .any(|custom_role| custom_role.system_role_ids().contains(*permission))
        })
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(AccessControlError::InvalidSelection {
            permissions: missing,
            detail: "member does not hold",
        });
    }

    let conflicts: Vec<CustomRoleConflict> = selected
        .iter()
        .filter_map(|permission| {
            let custom_roles: Vec<_> = custom_roles
                .iter()
                .filter(|custom_role| custom_role.system_role_ids().contains(permission))
                .map(|custom_role| (custom_role.id(), custom_role.name().to_string()))
                .collect();
            (!custom_roles.is_empty()).then(|| CustomRoleConflict {
                permission: permission.clone(),
                custom_roles,
            })
        })
        .collect();
    if !conflicts.is_empty() {
        return Err(AccessControlError::PermissionViaCustomRole { conflicts });
    }

    Ok(direct.difference(selected).cloned().collect())
}

/// Returns the direct roles after granting `selected`.
fn validate_grant(
    selected: &BTreeSet<SystemRoleId>,
    direct: &BTreeSet<SystemRoleId>,
) -> AccessResult<BTreeSet<SystemRoleId>> {
    let held: Vec<SystemRoleId> = selected.intersection(direct).cloned().collect();
    if !held.is_empty() {
        return Err(AccessControlError::InvalidSelection {
            permissions: held,
            detail: "member already holds directly",
        });
    }

    Ok(direct.union(selected).cloned().collect())
}

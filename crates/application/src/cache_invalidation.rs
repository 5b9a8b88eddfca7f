use atelier_core::TenantId;
use atelier_domain::ProfileId;
use tracing::warn;

use crate::PermissionCache;

/// Cached sets made stale by a committed write.
#[derive(Debug, Clone, Copy)]
pub(crate) enum StaleScope<'a> {
    Member(&'a str),
    Profile(ProfileId),
    Tenant,
}

/// Drops stale cached sets once a write has committed.
///
/// The write is authoritative, so a cache failure is logged and handed back
/// as a warning rather than turning the committed change into an error.
pub(crate) async fn invalidate_after_commit(
    cache: &dyn PermissionCache,
    tenant_id: TenantId,
    scope: StaleScope<'_>,
) -> Option<String> {
    let result = match scope {
        StaleScope::Member(user_id) => cache.invalidate_member(tenant_id, user_id).await,
        StaleScope::Profile(profile_id) => cache.invalidate_profile(tenant_id, profile_id).await,
        StaleScope::Tenant => cache.invalidate_tenant(tenant_id).await,
    };

    let error = result.err()?;
    warn!(%tenant_id, ?scope, %error, "change committed but cached permissions were not dropped");
    Some(format!(
        "the change was saved, but cached permissions could not be refreshed \
         and may lag until they expire: {error}"
    ))
}

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use atelier_core::{AppResult, TenantId};
use atelier_domain::{
    CustomRole, CustomRoleId, EffectivePermissionSet, GranularOverride, JobRole, Member, Profile,
    ProfileId, Resource,
};

/// Outcome of an optimistic profile write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileWrite {
    /// The write was applied; carries the stored profile at its new version.
    Written(Profile),
    /// Someone else wrote the profile since it was read; nothing was applied.
    Stale,
}

/// Repository port for permission profiles.
///
/// A profile's audit history is persisted together with the profile row, so
/// appending an entry and changing a permission field succeed or fail as a
/// unit.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Finds one profile, including its audit history.
    async fn find_profile(
        &self,
        tenant_id: TenantId,
        profile_id: ProfileId,
    ) -> AppResult<Option<Profile>>;

    /// Lists every profile in the tenant, ordered by name.
    async fn list_profiles(&self, tenant_id: TenantId) -> AppResult<Vec<Profile>>;

    /// Inserts a new profile at version zero.
    async fn insert_profile(&self, profile: Profile) -> AppResult<Profile>;

    /// Writes the profile if the stored version still equals `profile.version()`.
    async fn update_profile(&self, profile: Profile) -> AppResult<ProfileWrite>;

    /// Deletes a profile and its audit history.
    async fn delete_profile(&self, tenant_id: TenantId, profile_id: ProfileId) -> AppResult<()>;
}

/// Repository port for custom roles.
#[async_trait]
pub trait CustomRoleRepository: Send + Sync {
    /// Finds one custom role.
    async fn find_custom_role(
        &self,
        tenant_id: TenantId,
        custom_role_id: CustomRoleId,
    ) -> AppResult<Option<CustomRole>>;

    /// Finds the given custom roles; unknown ids are skipped.
    async fn find_custom_roles(
        &self,
        tenant_id: TenantId,
        custom_role_ids: &BTreeSet<CustomRoleId>,
    ) -> AppResult<Vec<CustomRole>>;

    /// Lists every custom role in the tenant, ordered by name.
    async fn list_custom_roles(&self, tenant_id: TenantId) -> AppResult<Vec<CustomRole>>;

    /// Inserts or replaces a custom role.
    async fn save_custom_role(&self, custom_role: CustomRole) -> AppResult<()>;

    /// Deletes a custom role.
    async fn delete_custom_role(
        &self,
        tenant_id: TenantId,
        custom_role_id: CustomRoleId,
    ) -> AppResult<()>;
}

/// Repository port for the tenant-wide granular override table.
#[async_trait]
pub trait GranularOverrideRepository: Send + Sync {
    /// Lists overrides, optionally for one job role, ordered by job role then resource.
    async fn list_overrides(
        &self,
        tenant_id: TenantId,
        job_role: Option<JobRole>,
    ) -> AppResult<Vec<GranularOverride>>;

    /// Replaces the action map stored for the override's key.
    async fn save_override(&self, granular_override: GranularOverride) -> AppResult<()>;

    /// Removes one override; returns whether it existed.
    async fn delete_override(
        &self,
        tenant_id: TenantId,
        resource: Resource,
        job_role: JobRole,
    ) -> AppResult<bool>;
}

/// Repository port for workshop memberships.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Finds a member by identity-provider user id.
    async fn find_member(&self, tenant_id: TenantId, user_id: &str) -> AppResult<Option<Member>>;

    /// Inserts or replaces a member.
    async fn save_member(&self, member: Member) -> AppResult<()>;

    /// Inserts the member only while its workshop has no members at all.
    ///
    /// The check and the insert are atomic: of two concurrent callers at most
    /// one gets `true`.
    async fn insert_first_member(&self, member: Member) -> AppResult<bool>;

    /// Counts members currently holding the profile.
    async fn count_members_with_profile(
        &self,
        tenant_id: TenantId,
        profile_id: ProfileId,
    ) -> AppResult<u64>;
}

/// Message delivered to a member whose permissions changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Workshop the change happened in.
    pub tenant_id: TenantId,
    /// Recipient user id.
    pub user_id: String,
    /// Recipient email, when known.
    pub email: Option<String>,
    /// Short subject line.
    pub subject: String,
    /// Plain-text body. Never contains the audit payload.
    pub body: String,
}

/// Port for the notification/email delivery channel.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Delivers one notification.
    async fn notify(&self, notification: Notification) -> AppResult<()>;
}

/// Port for caching resolved permission sets.
///
/// Every invalidation advances the tenant's generation. Readers take the
/// generation before loading state and hand it back to `put`, which drops
/// the set when an invalidation happened in between.
#[async_trait]
pub trait PermissionCache: Send + Sync {
    /// Returns a cached set for the member, if still valid.
    async fn get(
        &self,
        tenant_id: TenantId,
        user_id: &str,
    ) -> AppResult<Option<EffectivePermissionSet>>;

    /// Returns the tenant's current invalidation generation.
    async fn generation(&self, tenant_id: TenantId) -> AppResult<u64>;

    /// Stores a set resolved at `generation`, remembering its profile.
    ///
    /// Returns `false` without storing when the tenant was invalidated after
    /// `generation` was read.
    async fn put(
        &self,
        tenant_id: TenantId,
        user_id: &str,
        profile_id: Option<ProfileId>,
        generation: u64,
        permissions: EffectivePermissionSet,
    ) -> AppResult<bool>;

    /// Drops the entry for one member.
    async fn invalidate_member(&self, tenant_id: TenantId, user_id: &str) -> AppResult<()>;

    /// Drops every entry resolved from the profile.
    async fn invalidate_profile(&self, tenant_id: TenantId, profile_id: ProfileId)
    -> AppResult<()>;

    /// Drops every entry in the tenant.
    async fn invalidate_tenant(&self, tenant_id: TenantId) -> AppResult<()>;
}

/// Record-store ports shared by every access-control service.
#[derive(Clone)]
pub struct AccessRepositories {
    /// Permission profiles.
    pub profiles: Arc<dyn ProfileRepository>,
    /// Custom roles.
    pub custom_roles: Arc<dyn CustomRoleRepository>,
    /// Granular overrides.
    pub overrides: Arc<dyn GranularOverrideRepository>,
    /// Workshop memberships.
    pub members: Arc<dyn MemberRepository>,
}

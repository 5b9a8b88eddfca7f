//! Fake ports and builders shared by service tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use atelier_core::{AppError, AppResult, TenantId, UserIdentity};
use atelier_domain::{
    ACCESS_MANAGE_ROLE, AccessLevel, CustomRole, CustomRoleId, EffectivePermissionSet,
    GranularOverride, JobRole, Member, ModuleId, Profile, ProfileId, ProfileKind, ProfileParts,
    Resource, SystemRoleId, Tier,
};
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    AccessRepositories, AuthorizationService, CustomRoleRepository, GranularOverrideRepository,
    MemberRepository, Notification, NotificationSender, PermissionCache, ProfileRepository,
    ProfileWrite,
};

pub fn role(value: &str) -> SystemRoleId {
    SystemRoleId::new(value).unwrap_or_else(|_| unreachable!())
}

pub fn roles(values: &[&str]) -> BTreeSet<SystemRoleId> {
    values.iter().map(|value| role(value)).collect()
}

pub fn profile_parts(tenant_id: TenantId, name: &str, tier: Tier) -> ProfileParts {
    ProfileParts {
        id: ProfileId::new(),
        tenant_id,
        name: name.to_owned(),
        kind: ProfileKind::Internal,
        tier,
        job_roles: BTreeSet::new(),
        system_role_ids: BTreeSet::new(),
        custom_role_ids: BTreeSet::new(),
        module_access: BTreeMap::new(),
        sidebar_access: BTreeMap::new(),
        is_system: false,
        cloned_from: None,
        audit_log: Vec::new(),
        version: 0,
        updated_at: Utc::now(),
    }
}

pub fn build_profile(parts: ProfileParts) -> Profile {
    Profile::from_parts(parts).unwrap_or_else(|_| unreachable!())
}

pub fn viewer_profile(
    tenant_id: TenantId,
    name: &str,
    modules: &[(ModuleId, AccessLevel)],
) -> Profile {
    let mut parts = profile_parts(tenant_id, name, Tier::Viewer);
    parts.module_access = modules.iter().copied().collect();
    build_profile(parts)
}

pub fn custom_role(tenant_id: TenantId, name: &str, grants: &[&str]) -> CustomRole {
    CustomRole::new(CustomRoleId::new(), tenant_id, name, "", roles(grants))
        .unwrap_or_else(|_| unreachable!())
}

pub fn member(
    tenant_id: TenantId,
    user_id: &str,
    job_role: JobRole,
    profile_id: Option<ProfileId>,
) -> Member {
    Member::new(
        user_id,
        tenant_id,
        user_id,
        atelier_domain::EmailAddress::new(format!("{user_id}@oficina.com.br")).ok(),
        job_role,
        profile_id,
    )
    .unwrap_or_else(|_| unreachable!())
}

#[derive(Default)]
pub struct FakeProfileRepository {
    pub profiles: Mutex<HashMap<ProfileId, Profile>>,
    pub stale_writes_remaining: Mutex<u32>,
    pub fail_updates: bool,
}

#[async_trait]
impl ProfileRepository for FakeProfileRepository {
    async fn find_profile(
        &self,
        tenant_id: TenantId,
        profile_id: ProfileId,
    ) -> AppResult<Option<Profile>> {
        Ok(self
            .profiles
            .lock()
            .await
            .get(&profile_id)
            .filter(|profile| profile.tenant_id() == tenant_id)
            .cloned())
    }

    async fn list_profiles(&self, tenant_id: TenantId) -> AppResult<Vec<Profile>> {
        let mut listed: Vec<Profile> = self
            .profiles
            .lock()
            .await
            .values()
            .filter(|profile| profile.tenant_id() == tenant_id)
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));
        Ok(listed)
    }

    async fn insert_profile(&self, profile: Profile) -> AppResult<Profile> {
        self.profiles
            .lock()
            .await
            .insert(profile.id(), profile.clone());
        Ok(profile)
    }

    async fn update_profile(&self, mut profile: Profile) -> AppResult<ProfileWrite> {
        if self.fail_updates {
            return Err(AppError::Dependency("profile store unavailable".to_owned()));
        }

        {
            let mut stale = self.stale_writes_remaining.lock().await;
            if *stale > 0 {
                *stale -= 1;
                return Ok(ProfileWrite::Stale);
            }
        }

        let mut profiles = self.profiles.lock().await;
        let Some(stored) = profiles.get(&profile.id()) else {
            return Err(AppError::NotFound(format!(
                "profile '{}' does not exist",
                profile.id()
            )));
        };

        if stored.version() != profile.version() {
            return Ok(ProfileWrite::Stale);
        }

        profile.advance_version(Utc::now());
        profiles.insert(profile.id(), profile.clone());
        Ok(ProfileWrite::Written(profile))
    }

    async fn delete_profile(&self, _tenant_id: TenantId, profile_id: ProfileId) -> AppResult<()> {
        self.profiles.lock().await.remove(&profile_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeCustomRoleRepository {
    pub roles: Mutex<HashMap<CustomRoleId, CustomRole>>,
}

#[async_trait]
impl CustomRoleRepository for FakeCustomRoleRepository {
    async fn find_custom_role(
        &self,
        _tenant_id: TenantId,
        custom_role_id: CustomRoleId,
    ) -> AppResult<Option<CustomRole>> {
        Ok(self.roles.lock().await.get(&custom_role_id).cloned())
    }

    async fn find_custom_roles(
        &self,
        _tenant_id: TenantId,
        custom_role_ids: &BTreeSet<CustomRoleId>,
    ) -> AppResult<Vec<CustomRole>> {
        let roles = self.roles.lock().await;
        Ok(custom_role_ids
            .iter()
            .filter_map(|id| roles.get(id).cloned())
            .collect())
    }

    async fn list_custom_roles(&self, tenant_id: TenantId) -> AppResult<Vec<CustomRole>> {
        let mut listed: Vec<CustomRole> = self
            .roles
            .lock()
            .await
            .values()
            .filter(|custom_role| custom_role.tenant_id() == tenant_id)
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));
        Ok(listed)
    }

    async fn save_custom_role(&self, custom_role: CustomRole) -> AppResult<()> {
        self.roles
            .lock()
            .await
            .insert(custom_role.id(), custom_role);
        Ok(())
    }

    async fn delete_custom_role(
        &self,
        _tenant_id: TenantId,
        custom_role_id: CustomRoleId,
    ) -> AppResult<()> {
        self.roles.lock().await.remove(&custom_role_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeOverrideRepository {
    pub overrides: Mutex<Vec<GranularOverride>>,
    /// Saves allowed before every further save fails; `None` never fails.
    pub saves_before_failure: Mutex<Option<u32>>,
}

#[async_trait]
impl GranularOverrideRepository for FakeOverrideRepository {
    async fn list_overrides(
        &self,
        tenant_id: TenantId,
        job_role: Option<JobRole>,
    ) -> AppResult<Vec<GranularOverride>> {
        Ok(self
            .overrides
            .lock()
            .await
            .iter()
            .filter(|entry| entry.tenant_id() == tenant_id)
            .filter(|entry| job_role.is_none_or(|job_role| entry.job_role() == job_role))
            .cloned()
            .collect())
    }

    async fn save_override(&self, granular_override: GranularOverride) -> AppResult<()> {
        if let Some(remaining) = self.saves_before_failure.lock().await.as_mut() {
            if *remaining == 0 {
                return Err(AppError::Dependency("override store unavailable".to_owned()));
            }
            *remaining -= 1;
        }

        let mut overrides = self.overrides.lock().await;
        overrides.retain(|entry| {
            !(entry.tenant_id() == granular_override.tenant_id()
                && entry.resource() == granular_override.resource()
                && entry.job_role() == granular_override.job_role())
        });
        overrides.push(granular_override);
        Ok(())
    }

    async fn delete_override(
        &self,
        tenant_id: TenantId,
        resource: Resource,
        job_role: JobRole,
    ) -> AppResult<bool> {
        let mut overrides = self.overrides.lock().await;
        let before = overrides.len();
        overrides.retain(|entry| {
            !(entry.tenant_id() == tenant_id
                && entry.resource() == resource
                && entry.job_role() == job_role)
        });
        Ok(overrides.len() != before)
    }
}

#[derive(Default)]
pub struct FakeMemberRepository {
    pub members: Mutex<HashMap<(TenantId, String), Member>>,
}

#[async_trait]
impl MemberRepository for FakeMemberRepository {
    async fn find_member(&self, tenant_id: TenantId, user_id: &str) -> AppResult<Option<Member>> {
        Ok(self
            .members
            .lock()
            .await
            .get(&(tenant_id, user_id.to_owned()))
            .cloned())
    }

    async fn save_member(&self, member: Member) -> AppResult<()> {
        self.members
            .lock()
            .await
            .insert((member.tenant_id(), member.user_id().to_owned()), member);
        Ok(())
    }

    async fn insert_first_member(&self, member: Member) -> AppResult<bool> {
        let mut members = self.members.lock().await;
        if members
            .keys()
            .any(|(tenant_id, _)| *tenant_id == member.tenant_id())
        {
            return Ok(false);
        }
        members.insert((member.tenant_id(), member.user_id().to_owned()), member);
        Ok(true)
    }

    async fn count_members_with_profile(
        &self,
        tenant_id: TenantId,
        profile_id: ProfileId,
    ) -> AppResult<u64> {
        let count = self
            .members
            .lock()
            .await
            .values()
            .filter(|member| {
                member.tenant_id() == tenant_id && member.profile_id() == Some(profile_id)
            })
            .count();
        Ok(count as u64)
    }
}

#[derive(Default)]
pub struct FakeNotificationSender {
    pub sent: Mutex<Vec<Notification>>,
    pub fail: bool,
}

#[async_trait]
impl NotificationSender for FakeNotificationSender {
    async fn notify(&self, notification: Notification) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Dependency("smtp relay refused".to_owned()));
        }
        self.sent.lock().await.push(notification);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePermissionCache {
    pub entries: Mutex<HashMap<(TenantId, String), (Option<ProfileId>, EffectivePermissionSet)>>,
    pub generations: Mutex<HashMap<TenantId, u64>>,
    pub invalidations: Mutex<Vec<String>>,
    pub fail_invalidations: AtomicBool,
}

impl FakePermissionCache {
    async fn record_invalidation(&self, tenant_id: TenantId, label: String) -> AppResult<()> {
        if self.fail_invalidations.load(Ordering::SeqCst) {
            return Err(AppError::Dependency("permission cache unreachable".to_owned()));
        }
        *self.generations.lock().await.entry(tenant_id).or_insert(0) += 1;
        self.invalidations.lock().await.push(label);
        Ok(())
    }
}

#[async_trait]
impl PermissionCache for FakePermissionCache {
    async fn get(
        &self,
        tenant_id: TenantId,
        user_id: &str,
    ) -> AppResult<Option<EffectivePermissionSet>> {
        Ok(self
            .entries
            .lock()
            .await
            .get(&(tenant_id, user_id.to_owned()))
            .map(|(_, permissions)| permissions.clone()))
    }

    async fn generation(&self, tenant_id: TenantId) -> AppResult<u64> {
        Ok(self
            .generations
            .lock()
            .await
            .get(&tenant_id)
            .copied()
            .unwrap_or(0))
    }

    async fn put(
        &self,
        tenant_id: TenantId,
        user_id: &str,
        profile_id: Option<ProfileId>,
        generation: u64,
        permissions: EffectivePermissionSet,
    ) -> AppResult<bool> {
        let generations = self.generations.lock().await;
        if generations.get(&tenant_id).copied().unwrap_or(0) != generation {
            return Ok(false);
        }
        self.entries
            .lock()
            .await
            .insert((tenant_id, user_id.to_owned()), (profile_id, permissions));
        Ok(true)
    }

    async fn invalidate_member(&self, tenant_id: TenantId, user_id: &str) -> AppResult<()> {
        self.record_invalidation(tenant_id, format!("member:{user_id}"))
            .await?;
        self.entries
            .lock()
            .await
            .remove(&(tenant_id, user_id.to_owned()));
        Ok(())
    }

    async fn invalidate_profile(
        &self,
        tenant_id: TenantId,
        profile_id: ProfileId,
    ) -> AppResult<()> {
        self.record_invalidation(tenant_id, format!("profile:{profile_id}"))
            .await?;
        self.entries.lock().await.retain(|(stored_tenant, _), (stored_profile, _)| {
            !(stored_tenant == &tenant_id && stored_profile == &Some(profile_id))
        });
        Ok(())
    }

    async fn invalidate_tenant(&self, tenant_id: TenantId) -> AppResult<()> {
        self.record_invalidation(tenant_id, format!("tenant:{tenant_id}"))
            .await?;
        self.entries
            .lock()
            .await
            .retain(|(stored_tenant, _), _| stored_tenant != &tenant_id);
        Ok(())
    }
}

/// Fakes wired together with one seeded administrator.
pub struct Harness {
    pub tenant_id: TenantId,
    pub profiles: Arc<FakeProfileRepository>,
    pub custom_roles: Arc<FakeCustomRoleRepository>,
    pub overrides: Arc<FakeOverrideRepository>,
    pub members: Arc<FakeMemberRepository>,
    pub cache: Arc<FakePermissionCache>,
    pub admin_profile_id: ProfileId,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_profiles(FakeProfileRepository::default()).await
    }

    pub async fn with_profiles(profiles: FakeProfileRepository) -> Self {
        let tenant_id = TenantId::new();
        let harness = Self {
            tenant_id,
            profiles: Arc::new(profiles),
            custom_roles: Arc::new(FakeCustomRoleRepository::default()),
            overrides: Arc::new(FakeOverrideRepository::default()),
            members: Arc::new(FakeMemberRepository::default()),
            cache: Arc::new(FakePermissionCache::default()),
            admin_profile_id: ProfileId::new(),
        };

        let mut admin_parts = profile_parts(tenant_id, "Administrator", Tier::Admin);
        admin_parts.id = harness.admin_profile_id;
        admin_parts.kind = ProfileKind::System;
        admin_parts.is_system = true;
        admin_parts.system_role_ids = roles(&[ACCESS_MANAGE_ROLE]);
        harness.insert_profile(build_profile(admin_parts)).await;
        harness
            .insert_member(member(
                tenant_id,
                "admin",
                JobRole::Director,
                Some(harness.admin_profile_id),
            ))
            .await;

        harness
    }

    pub fn repositories(&self) -> AccessRepositories {
        AccessRepositories {
            profiles: self.profiles.clone(),
            custom_roles: self.custom_roles.clone(),
            overrides: self.overrides.clone(),
            members: self.members.clone(),
        }
    }

    pub fn authorization_service(&self) -> AuthorizationService {
        AuthorizationService::new(self.repositories(), self.cache.clone())
    }

    pub fn admin(&self) -> UserIdentity {
        UserIdentity::new(
            "admin",
            "Admin",
            Some("admin@oficina.com.br".to_owned()),
            self.tenant_id,
        )
    }

    pub fn actor(&self, user_id: &str) -> UserIdentity {
        UserIdentity::new(user_id, user_id, None, self.tenant_id)
    }

    pub async fn insert_profile(&self, profile: Profile) {
        self.profiles
            .profiles
            .lock()
            .await
            .insert(profile.id(), profile);
    }

    pub async fn insert_custom_role(&self, custom_role: CustomRole) {
        self.custom_roles
            .roles
            .lock()
            .await
            .insert(custom_role.id(), custom_role);
    }

    pub async fn insert_member(&self, member: Member) {
        self.members
            .members
            .lock()
            .await
            .insert((member.tenant_id(), member.user_id().to_owned()), member);
    }

    pub async fn stored_profile(&self, profile_id: ProfileId) -> Profile {
        self.profiles
            .profiles
            .lock()
            .await
            .get(&profile_id)
            .cloned()
            .unwrap_or_else(|| unreachable!())
    }
}

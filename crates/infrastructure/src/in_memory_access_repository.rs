use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use atelier_application::{
    AccessRepositories, CustomRoleRepository, GranularOverrideRepository, MemberRepository,
    ProfileRepository, ProfileWrite,
};
use atelier_core::{AppError, AppResult, TenantId};
use atelier_domain::{
    CustomRole, CustomRoleId, GranularOverride, JobRole, Member, Profile, ProfileId, Resource,
};
use chrono::Utc;
use tokio::sync::RwLock;

/// In-memory record store implementing every access-control repository port.
///
/// Used by the API when no database is configured and by tests.
#[derive(Debug, Default)]
pub struct InMemoryAccessRepository {
    profiles: RwLock<HashMap<(TenantId, ProfileId), Profile>>,
    custom_roles: RwLock<HashMap<(TenantId, CustomRoleId), CustomRole>>,
    overrides: RwLock<HashMap<(TenantId, JobRole, Resource), GranularOverride>>,
    members: RwLock<HashMap<(TenantId, String), Member>>,
}

impl InMemoryAccessRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares one store behind all four repository ports.
    #[must_use]
    pub fn into_repositories(self) -> AccessRepositories {
        let repository = Arc::new(self);
        AccessRepositories {
            profiles: repository.clone(),
            custom_roles: repository.clone(),
            overrides: repository.clone(),
            members: repository,
        }
    }
}

fn ensure_unique_profile_name(
    profiles: &HashMap<(TenantId, ProfileId), Profile>,
    candidate: &Profile,
) -> AppResult<()> {
    let taken = profiles.values().any(|stored| {
        stored.tenant_id() == candidate.tenant_id()
            && stored.id() != candidate.id()
            && stored.name().eq_ignore_case(candidate.name().as_str())
    });

    if taken {
        return Err(AppError::Conflict(format!(
            "profile '{}' already exists for tenant '{}'",
            candidate.name(),
            candidate.tenant_id()
        )));
    }

    Ok(())
}

#[async_trait]
impl ProfileRepository for InMemoryAccessRepository {
    async fn find_profile(
        &self,
        tenant_id: TenantId,
        profile_id: ProfileId,
    ) -> AppResult<Option<Profile>> {
        Ok(self
            .profiles
            .read()
            .await
            .get(&(tenant_id, profile_id))
            .cloned())
    }

    async fn list_profiles(&self, tenant_id: TenantId) -> AppResult<Vec<Profile>> {
        let profiles = self.profiles.read().await;

        let mut values: Vec<Profile> = profiles
            .iter()
            .filter_map(|((stored_tenant_id, _), profile)| {
                (stored_tenant_id == &tenant_id).then_some(profile.clone())
            })
            .collect();
        values.sort_by_key(|profile| profile.name().as_str().to_lowercase());

        Ok(values)
    }

    async fn insert_profile(&self, profile: Profile) -> AppResult<Profile> {
        let key = (profile.tenant_id(), profile.id());
        let mut profiles = self.profiles.write().await;

        if profiles.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "profile '{}' already exists",
                profile.id()
            )));
        }
        ensure_unique_profile_name(&profiles, &profile)?;

        profiles.insert(key, profile.clone());
        Ok(profile)
    }

    async fn update_profile(&self, mut profile: Profile) -> AppResult<ProfileWrite> {
        let key = (profile.tenant_id(), profile.id());
        let mut profiles = self.profiles.write().await;

        let Some(stored) = profiles.get(&key) else {
            return Err(AppError::NotFound(format!(
                "profile '{}' does not exist for tenant '{}'",
                key.1, key.0
            )));
        };
        if stored.version() != profile.version() {
            return Ok(ProfileWrite::Stale);
        }
        ensure_unique_profile_name(&profiles, &profile)?;

        profile.advance_version(Utc::now());
        profiles.insert(key, profile.clone());
        Ok(ProfileWrite::Written(profile))
    }

    async fn delete_profile(&self, tenant_id: TenantId, profile_id: ProfileId) -> AppResult<()> {
        self.profiles.write().await.remove(&(tenant_id, profile_id));
        Ok(())
    }
}

#[async_trait]
impl CustomRoleRepository for InMemoryAccessRepository {
    async fn find_custom_role(
        &self,
        tenant_id: TenantId,
        custom_role_id: CustomRoleId,
    ) -> AppResult<Option<CustomRole>> {
        Ok(self
            .custom_roles
            .read()
            .await
            .get(&(tenant_id, custom_role_id))
            .cloned())
    }

    async fn find_custom_roles(
        &self,
        tenant_id: TenantId,
        custom_role_ids: &BTreeSet<CustomRoleId>,
    ) -> AppResult<Vec<CustomRole>> {
        let custom_roles = self.custom_roles.read().await;

        Ok(custom_role_ids
            .iter()
            .filter_map(|custom_role_id| custom_roles.get(&(tenant_id, *custom_role_id)))
            .cloned()
            .collect())
    }

    async fn list_custom_roles(&self, tenant_id: TenantId) -> AppResult<Vec<CustomRole>> {
        let custom_roles = self.custom_roles.read().await;

        let mut values: Vec<CustomRole> = custom_roles
            .iter()
            .filter_map(|((stored_tenant_id, _), custom_role)| {
                (stored_tenant_id == &tenant_id).then_some(custom_role.clone())
            })
            .collect();
        values.sort_by_key(|custom_role| custom_role.name().as_str().to_lowercase());

        Ok(values)
    }

    async fn save_custom_role(&self, custom_role: CustomRole) -> AppResult<()> {
        let key = (custom_role.tenant_id(), custom_role.id());
        let mut custom_roles = self.custom_roles.write().await;

        let taken = custom_roles.values().any(|stored| {
            stored.tenant_id() == key.0
                && stored.id() != key.1
                && stored.name().eq_ignore_case(custom_role.name().as_str())
        });
        if taken {
            return Err(AppError::Conflict(format!(
                "custom role '{}' already exists for tenant '{}'",
                custom_role.name(),
                key.0
            )));
        }

        custom_roles.insert(key, custom_role);
        Ok(())
    }

    async fn delete_custom_role(
        &self,
        tenant_id: TenantId,
        custom_role_id: CustomRoleId,
    ) -> AppResult<()> {
        self.custom_roles
            .write()
            .await
            .remove(&(tenant_id, custom_role_id));
        Ok(())
    }
}

#[async_trait]
impl GranularOverrideRepository for InMemoryAccessRepository {
    async fn list_overrides(
        &self,
        tenant_id: TenantId,
        job_role: Option<JobRole>,
    ) -> AppResult<Vec<GranularOverride>> {
        let overrides = self.overrides.read().await;

        let mut values: Vec<(&(TenantId, JobRole, Resource), &GranularOverride)> = overrides
            .iter()
            .filter(|((stored_tenant_id, stored_job_role, _), _)| {
                stored_tenant_id == &tenant_id
                    && job_role.is_none_or(|job_role| job_role == *stored_job_role)
            })
            .collect();
        values.sort_by_key(|(key, _)| **key);

        Ok(values
            .into_iter()
            .map(|(_, granular_override)| granular_override.clone())
            .collect())
    }

    async fn save_override(&self, granular_override: GranularOverride) -> AppResult<()> {
        self.overrides.write().await.insert(
            (
                granular_override.tenant_id(),
                granular_override.job_role(),
                granular_override.resource(),
            ),
            granular_override,
        );
        Ok(())
    }

    async fn delete_override(
        &self,
        tenant_id: TenantId,
        resource: Resource,
        job_role: JobRole,
    ) -> AppResult<bool> {
        Ok(self
            .overrides
            .write()
            .await
            .remove(&(tenant_id, job_role, resource))
            .is_some())
    }
}

#[async_trait]
impl MemberRepository for InMemoryAccessRepository {
    async fn find_member(&self, tenant_id: TenantId, user_id: &str) -> AppResult<Option<Member>> {
        Ok(self
            .members
            .read()
            .await
            .get(&(tenant_id, user_id.to_owned()))
            .cloned())
    }

    async fn save_member(&self, member: Member) -> AppResult<()> {
        self.members
            .write()
            .await
            .insert((member.tenant_id(), member.user_id().to_owned()), member);
        Ok(())
    }

    async fn insert_first_member(&self, member: Member) -> AppResult<bool> {
        let mut members = self.members.write().await;
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
            .read()
            .await
            .values()
            .filter(|member| {
                member.tenant_id() == tenant_id && member.profile_id() == Some(profile_id)
            })
            .count();

        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests;

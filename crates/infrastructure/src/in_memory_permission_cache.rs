use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use atelier_application::PermissionCache;
use atelier_core::{AppResult, TenantId};
use atelier_domain::{EffectivePermissionSet, ProfileId};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct PermissionCacheEntry {
    profile_id: Option<ProfileId>,
    permissions: EffectivePermissionSet,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<(TenantId, String), PermissionCacheEntry>,
    generations: HashMap<TenantId, u64>,
}

impl CacheState {
    fn generation(&self, tenant_id: TenantId) -> u64 {
        self.generations.get(&tenant_id).copied().unwrap_or(0)
    }

    fn advance(&mut self, tenant_id: TenantId) {
        let generation = self.generations.entry(tenant_id).or_insert(0);
        *generation = generation.wrapping_add(1);
    }
}

/// In-memory TTL cache for resolved permission sets.
///
/// A TTL of zero disables caching: every lookup misses and nothing is stored.
/// Entries and generations share one lock, so a `put` can never land after
/// an invalidation it did not observe.
#[derive(Debug)]
pub struct InMemoryPermissionCache {
    ttl: Duration,
    state: RwLock<CacheState>,
}

impl InMemoryPermissionCache {
    /// Creates an empty cache whose entries live for `ttl_seconds`.
    #[must_use]
    pub fn new(ttl_seconds: u32) -> Self {
        Self {
            ttl: Duration::from_secs(u64::from(ttl_seconds)),
            state: RwLock::new(CacheState::default()),
        }
    }

    async fn remove_where(
        &self,
        tenant_id: TenantId,
        predicate: impl Fn(&(TenantId, String), &PermissionCacheEntry) -> bool,
    ) {
        let mut state = self.state.write().await;
        state.advance(tenant_id);
        state.entries.retain(|key, entry| !predicate(key, entry));
    }
}

#[async_trait]
impl PermissionCache for InMemoryPermissionCache {
    async fn get(
        &self,
        tenant_id: TenantId,
        user_id: &str,
    ) -> AppResult<Option<EffectivePermissionSet>> {
        let key = (tenant_id, user_id.to_owned());
        {
            let state = self.state.read().await;
            if let Some(entry) = state.entries.get(&key) {
                if entry.expires_at > Instant::now() {
                    return Ok(Some(entry.permissions.clone()));
                }
            } else {
                return Ok(None);
            }
        }

        let mut state = self.state.write().await;
        if state
            .entries
            .get(&key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            state.entries.remove(&key);
        }

        Ok(None)
    }

    async fn generation(&self, tenant_id: TenantId) -> AppResult<u64> {
        Ok(self.state.read().await.generation(tenant_id))
    }

    async fn put(
        &self,
        tenant_id: TenantId,
        user_id: &str,
        profile_id: Option<ProfileId>,
        generation: u64,
        permissions: EffectivePermissionSet,
    ) -> AppResult<bool> {
        if self.ttl.is_zero() {
            return Ok(false);
        }

        let now = Instant::now();
        let expires_at = now.checked_add(self.ttl).unwrap_or(now);

        let mut state = self.state.write().await;
        if state.generation(tenant_id) != generation {
            return Ok(false);
        }
        state.entries.insert(
            (tenant_id, user_id.to_owned()),
            PermissionCacheEntry {
                profile_id,
                permissions,
                expires_at,
            },
        );

        Ok(true)
    }

    async fn invalidate_member(&self, tenant_id: TenantId, user_id: &str) -> AppResult<()> {
        self.remove_where(tenant_id, |(stored_tenant_id, stored_user_id), _| {
            *stored_tenant_id == tenant_id && stored_user_id == user_id
        })
        .await;
        Ok(())
    }

    async fn invalidate_profile(
        &self,
        tenant_id: TenantId,
        profile_id: ProfileId,
    ) -> AppResult<()> {
        self.remove_where(tenant_id, |(stored_tenant_id, _), entry| {
            *stored_tenant_id == tenant_id && entry.profile_id == Some(profile_id)
        })
        .await;
        Ok(())
    }

    async fn invalidate_tenant(&self, tenant_id: TenantId) -> AppResult<()> {
        self.remove_where(tenant_id, |(stored_tenant_id, _), _| {
            *stored_tenant_id == tenant_id
        })
        .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use atelier_application::PermissionCache;
    use atelier_core::TenantId;
    use atelier_domain::{EffectivePermissionSet, ProfileId};

    use super::InMemoryPermissionCache;

    async fn put(
        cache: &InMemoryPermissionCache,
        tenant_id: TenantId,
        user_id: &str,
        profile_id: Option<ProfileId>,
    ) -> bool {
        let generation = cache
            .generation(tenant_id)
            .await
            .unwrap_or_else(|_| unreachable!());
        cache
            .put(
                tenant_id,
                user_id,
                profile_id,
                generation,
                EffectivePermissionSet::deny_all(),
            )
            .await
            .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn stored_sets_are_served_back() {
        let cache = InMemoryPermissionCache::new(60);
        let tenant_id = TenantId::new();

        assert!(put(&cache, tenant_id, "ana", None).await);

        let hit = cache.get(tenant_id, "ana").await;
        assert!(matches!(hit, Ok(Some(set)) if set == EffectivePermissionSet::deny_all()));
        let other_tenant = cache.get(TenantId::new(), "ana").await;
        assert!(matches!(other_tenant, Ok(None)));
    }

    #[tokio::test]
    async fn zero_ttl_disables_caching() {
        let cache = InMemoryPermissionCache::new(0);
        let tenant_id = TenantId::new();

        assert!(!put(&cache, tenant_id, "ana", None).await);

        assert!(matches!(cache.get(tenant_id, "ana").await, Ok(None)));
    }

    #[tokio::test]
    async fn set_resolved_before_an_invalidation_is_not_stored() {
        let cache = InMemoryPermissionCache::new(60);
        let tenant_id = TenantId::new();
        let profile_id = ProfileId::new();
        let before = cache
            .generation(tenant_id)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert!(cache.invalidate_profile(tenant_id, profile_id).await.is_ok());
        let stored = cache
            .put(
                tenant_id,
                "ana",
                Some(profile_id),
                before,
                EffectivePermissionSet::deny_all(),
            )
            .await;

        assert!(matches!(stored, Ok(false)));
        assert!(matches!(cache.get(tenant_id, "ana").await, Ok(None)));

        let neighbour = TenantId::new();
        assert!(put(&cache, neighbour, "ana", None).await);
    }

    #[tokio::test]
    async fn profile_invalidation_only_drops_holders_of_that_profile() {
        let cache = InMemoryPermissionCache::new(60);
        let tenant_id = TenantId::new();
        let edited = ProfileId::new();
        let untouched = ProfileId::new();
        for (user_id, profile_id) in [
            ("ana", Some(edited)),
            ("bruno", Some(untouched)),
            ("carla", None),
        ] {
            assert!(put(&cache, tenant_id, user_id, profile_id).await);
        }

        assert!(cache.invalidate_profile(tenant_id, edited).await.is_ok());

        assert!(matches!(cache.get(tenant_id, "ana").await, Ok(None)));
        assert!(matches!(cache.get(tenant_id, "bruno").await, Ok(Some(_))));
        assert!(matches!(cache.get(tenant_id, "carla").await, Ok(Some(_))));
    }

    #[tokio::test]
    async fn tenant_and_member_invalidation_are_scoped() {
        let cache = InMemoryPermissionCache::new(60);
        let workshop = TenantId::new();
        let neighbour = TenantId::new();
        for (tenant_id, user_id) in [(workshop, "ana"), (workshop, "bruno"), (neighbour, "ana")] {
            assert!(put(&cache, tenant_id, user_id, None).await);
        }

        assert!(cache.invalidate_member(workshop, "ana").await.is_ok());
        assert!(matches!(cache.get(workshop, "ana").await, Ok(None)));
        assert!(matches!(cache.get(workshop, "bruno").await, Ok(Some(_))));

        assert!(cache.invalidate_tenant(workshop).await.is_ok());
        assert!(matches!(cache.get(workshop, "bruno").await, Ok(None)));
        assert!(matches!(cache.get(neighbour, "ana").await, Ok(Some(_))));
    }
}

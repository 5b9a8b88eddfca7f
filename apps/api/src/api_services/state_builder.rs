use std::sync::Arc;

use atelier_application::{
    AccessRepositories, AuthorizationService, CustomRoleService, GranularMatrixService,
    NotificationSender, PermissionCache, ProfileService, RevocationService,
    TenantBootstrapService,
};
use atelier_core::AppError;
use atelier_infrastructure::{
    InMemoryAccessRepository, InMemoryPermissionCache, PostgresCustomRoleRepository,
    PostgresGranularOverrideRepository, PostgresMemberRepository, PostgresProfileRepository,
};
use sqlx::PgPool;
use tracing::{info, warn};

use super::database::connect_and_migrate;
use super::notifications::build_notification_sender;
use crate::api_config::ApiConfig;
use crate::state::AppState;

pub async fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let (repositories, postgres_pool) = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = connect_and_migrate(database_url).await?;
            info!("using postgres access-control store");
            (postgres_repositories(&pool), Some(pool))
        }
        None => {
            warn!("DATABASE_URL is not set; access-control data lives in memory only");
            (InMemoryAccessRepository::new().into_repositories(), None)
        }
    };

    let cache: Arc<dyn PermissionCache> =
        Arc::new(InMemoryPermissionCache::new(config.permission_cache_ttl_seconds));
    let notification_sender = build_notification_sender(&config.notification_provider);

    Ok(assemble_state(
        repositories,
        cache,
        notification_sender,
        config.max_write_attempts,
        postgres_pool,
    ))
}

fn postgres_repositories(pool: &PgPool) -> AccessRepositories {
    AccessRepositories {
        profiles: Arc::new(PostgresProfileRepository::new(pool.clone())),
        custom_roles: Arc::new(PostgresCustomRoleRepository::new(pool.clone())),
        overrides: Arc::new(PostgresGranularOverrideRepository::new(pool.clone())),
        members: Arc::new(PostgresMemberRepository::new(pool.clone())),
    }
}

pub(crate) fn assemble_state(
    repositories: AccessRepositories,
    cache: Arc<dyn PermissionCache>,
    notification_sender: Arc<dyn NotificationSender>,
    max_write_attempts: u32,
    postgres_pool: Option<PgPool>,
) -> AppState {
    let authorization_service = AuthorizationService::new(repositories.clone(), cache.clone());

    AppState {
        profile_service: ProfileService::new(
            authorization_service.clone(),
            repositories.clone(),
            cache.clone(),
            max_write_attempts,
        ),
        revocation_service: RevocationService::new(
            authorization_service.clone(),
            repositories.clone(),
            cache.clone(),
            notification_sender,
            max_write_attempts,
        ),
        custom_role_service: CustomRoleService::new(
            authorization_service.clone(),
            repositories.clone(),
            cache.clone(),
        ),
        granular_matrix_service: GranularMatrixService::new(
            authorization_service.clone(),
            repositories.clone(),
            cache.clone(),
        ),
        tenant_bootstrap_service: TenantBootstrapService::new(repositories, cache),
        authorization_service,
        postgres_pool,
    }
}

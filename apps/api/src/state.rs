use atelier_application::{
    AuthorizationService, CustomRoleService, GranularMatrixService, ProfileService,
    RevocationService, TenantBootstrapService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub profile_service: ProfileService,
    pub revocation_service: RevocationService,
    pub custom_role_service: CustomRoleService,
    pub granular_matrix_service: GranularMatrixService,
    pub tenant_bootstrap_service: TenantBootstrapService,
    /// Present only when the access-control store is PostgreSQL.
    pub postgres_pool: Option<PgPool>,
}

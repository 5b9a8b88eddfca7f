mod cors;

use atelier_core::AppError;
use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{delete, get, post, put};
use tower_http::trace::TraceLayer;

use crate::handlers::{access, health};
use crate::middleware;
use crate::state::AppState;

use self::cors::build_cors_layer;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let access_routes = Router::new()
        .route("/api/access/bootstrap", post(access::bootstrap_handler))
        .route(
            "/api/access/me/permissions",
            get(access::my_permissions_handler),
        )
        .route("/api/access/check", get(access::check_access_handler))
        .route("/api/access/members", post(access::onboard_member_handler))
        .route(
            "/api/access/members/{user_id}/profile",
            put(access::assign_profile_handler),
        )
        .route(
            "/api/access/members/{user_id}/permissions",
            get(access::member_permissions_handler),
        )
        .route(
            "/api/access/members/{user_id}/revocations",
            post(access::revoke_permissions_handler),
        )
        .route(
            "/api/access/members/{user_id}/grants",
            post(access::grant_permissions_handler),
        )
        .route(
            "/api/access/profiles",
            get(access::list_profiles_handler).post(access::create_profile_handler),
        )
        .route(
            "/api/access/profiles/defaults",
            post(access::seed_default_profiles_handler),
        )
        .route(
            "/api/access/profiles/{profile_id}",
            get(access::get_profile_handler)
                .patch(access::update_profile_handler)
                .delete(access::delete_profile_handler),
        )
        .route(
            "/api/access/profiles/{profile_id}/clone",
            post(access::clone_profile_handler),
        )
        .route(
            "/api/access/profiles/{profile_id}/audit-log",
            get(access::profile_audit_log_handler),
        )
        .route(
            "/api/access/custom-roles",
            get(access::list_custom_roles_handler).post(access::create_custom_role_handler),
        )
        .route(
            "/api/access/custom-roles/{custom_role_id}",
            delete(access::delete_custom_role_handler),
        )
        .route(
            "/api/access/custom-roles/{custom_role_id}/grants",
            put(access::update_custom_role_grants_handler),
        )
        .route(
            "/api/access/overrides",
            get(access::list_overrides_handler)
                .put(access::set_override_handler)
                .delete(access::delete_override_handler),
        )
        .route(
            "/api/access/overrides/preview",
            post(access::preview_overrides_handler),
        )
        .route(
            "/api/access/overrides/changes",
            post(access::apply_override_changes_handler),
        )
        .route(
            "/api/access/overrides/sync",
            put(access::sync_overrides_handler),
        )
        .route_layer(from_fn(middleware::require_identity));

    let cors_layer = build_cors_layer(frontend_url)?;

    Ok(Router::new()
        .route("/health", get(health::health_handler))
        .merge(access_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state))
}

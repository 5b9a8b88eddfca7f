use atelier_application::PermissionChangeRequest;

use super::*;
use crate::dto::parse_system_roles;

fn change_request(
    user_id: String,
    payload: PermissionChangeBody,
) -> ApiResult<PermissionChangeRequest> {
    Ok(PermissionChangeRequest {
        user_id,
        permissions: parse_system_roles(payload.permissions)?,
        reason: payload.reason,
    })
}

pub async fn revoke_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Json(payload): Json<PermissionChangeBody>,
) -> ApiResult<Json<RevocationResponse>> {
    let result = state
        .revocation_service
        .revoke_permissions(&user, change_request(user_id, payload)?)
        .await?;

    Ok(Json(RevocationResponse::from(result)))
}

pub async fn grant_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Json(payload): Json<PermissionChangeBody>,
) -> ApiResult<Json<RevocationResponse>> {
    let result = state
        .revocation_service
        .grant_permissions(&user, change_request(user_id, payload)?)
        .await?;

    Ok(Json(RevocationResponse::from(result)))
}

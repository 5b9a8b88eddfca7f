use atelier_application::CreateCustomRoleInput;

use super::*;
use crate::dto::parse_system_roles;

pub async fn list_custom_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<CustomRoleResponse>>> {
    let roles = state
        .custom_role_service
        .list_custom_roles(&user)
        .await?
        .into_iter()
        .map(CustomRoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_custom_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateCustomRoleRequest>,
) -> ApiResult<(StatusCode, Json<CustomRoleResponse>)> {
    let role = state
        .custom_role_service
        .create_custom_role(
            &user,
            CreateCustomRoleInput {
                name: payload.name,
                description: payload.description,
                system_role_ids: parse_system_roles(payload.system_role_ids)?,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CustomRoleResponse::from(role))))
}

pub async fn update_custom_role_grants_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(custom_role_id): Path<String>,
    Json(payload): Json<UpdateCustomRoleGrantsRequest>,
) -> ApiResult<Json<CustomRoleResponse>> {
    let role = state
        .custom_role_service
        .update_custom_role_grants(
            &user,
            CustomRoleId::parse(custom_role_id.as_str())?,
            parse_system_roles(payload.system_role_ids)?,
        )
        .await?;

    Ok(Json(CustomRoleResponse::from(role)))
}

pub async fn delete_custom_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(custom_role_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .custom_role_service
        .delete_custom_role(&user, CustomRoleId::parse(custom_role_id.as_str())?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

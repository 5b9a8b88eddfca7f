use atelier_domain::{Action, Resource};

use super::*;

pub async fn onboard_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<OnboardMemberRequest>,
) -> ApiResult<(StatusCode, Json<MemberResponse>)> {
    let member = state
        .profile_service
        .onboard_member(&user, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(MemberResponse::from(member))))
}

pub async fn assign_profile_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Json(payload): Json<AssignProfileRequest>,
) -> ApiResult<Json<MemberResponse>> {
    let profile_id = ProfileId::parse(payload.profile_id.as_str())?;
    let member = state
        .profile_service
        .assign_profile(&user, user_id.as_str(), profile_id)
        .await?;

    Ok(Json(MemberResponse::from(member)))
}

pub async fn member_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let permissions = state
        .authorization_service
        .resolve_member_permissions(&user, user_id.as_str())
        .await?;

    Ok(Json(permissions.into()))
}

pub async fn my_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let permissions = state
        .authorization_service
        .resolve_member_permissions(&user, user.user_id())
        .await?;

    Ok(Json(permissions.into()))
}

/// Answers one access question for the caller. Resolution failures deny.
pub async fn check_access_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<AccessCheckQuery>,
) -> ApiResult<Json<AccessCheckResponse>> {
    let resource = query.resource.parse::<Resource>()?;
    let action = query.action.parse::<Action>()?;
    let allowed = state
        .authorization_service
        .check_access(&user, resource, action)
        .await;

    Ok(Json(AccessCheckResponse {
        resource: query.resource,
        action: query.action,
        allowed,
    }))
}

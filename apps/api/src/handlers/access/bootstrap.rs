use super::*;

/// Makes the first caller in an empty workshop its administrator.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<(StatusCode, Json<MemberResponse>)> {
    let owner = state.tenant_bootstrap_service.bootstrap_owner(&user).await?;

    Ok((StatusCode::CREATED, Json(MemberResponse::from(owner))))
}

pub async fn seed_default_profiles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<ProfileResponse>>> {
    state.authorization_service.require_admin(&user).await?;

    let created = state
        .tenant_bootstrap_service
        .seed_default_profiles(user.tenant_id())
        .await?
        .into_iter()
        .map(ProfileResponse::from)
        .collect();

    Ok(Json(created))
}

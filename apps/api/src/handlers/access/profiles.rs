use super::*;

pub async fn list_profiles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<ProfileResponse>>> {
    let profiles = state
        .profile_service
        .list_profiles(&user)
        .await?
        .into_iter()
        .map(ProfileResponse::from)
        .collect();

    Ok(Json(profiles))
}

pub async fn create_profile_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateProfileRequest>,
) -> ApiResult<(StatusCode, Json<ProfileResponse>)> {
    let profile = state
        .profile_service
        .create_profile(&user, payload.into_input()?)
        .await?;

    Ok((StatusCode::CREATED, Json(ProfileResponse::from(profile))))
}

pub async fn get_profile_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(profile_id): Path<String>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = state
        .profile_service
        .get_profile(&user, ProfileId::parse(profile_id.as_str())?)
        .await?;

    Ok(Json(ProfileResponse::from(profile)))
}

pub async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(profile_id): Path<String>,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = state
        .profile_service
        .update_profile(
            &user,
            ProfileId::parse(profile_id.as_str())?,
            payload.into_patch()?,
        )
        .await?;

    Ok(Json(ProfileResponse::from(profile)))
}

pub async fn delete_profile_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(profile_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .profile_service
        .delete_profile(&user, ProfileId::parse(profile_id.as_str())?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn clone_profile_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(profile_id): Path<String>,
    Json(payload): Json<CloneProfileRequest>,
) -> ApiResult<(StatusCode, Json<ProfileResponse>)> {
    let profile = state
        .profile_service
        .clone_profile(
            &user,
            ProfileId::parse(profile_id.as_str())?,
            payload.into_input()?,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ProfileResponse::from(profile))))
}

pub async fn profile_audit_log_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(profile_id): Path<String>,
) -> ApiResult<Json<Vec<AuditEntryResponse>>> {
    let entries = state
        .profile_service
        .profile_audit_log(&user, ProfileId::parse(profile_id.as_str())?)
        .await?
        .into_iter()
        .map(AuditEntryResponse::from)
        .collect();

    Ok(Json(entries))
}

use atelier_application::diff_overrides;

use super::*;

pub async fn list_overrides_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<OverrideListQuery>,
) -> ApiResult<Json<Vec<GranularOverrideResponse>>> {
    let job_role = query.job_role.as_deref().map(str::parse).transpose()?;
    let overrides = state
        .granular_matrix_service
        .list_overrides(&user, job_role)
        .await?
        .into_iter()
        .map(GranularOverrideResponse::from)
        .collect();

    Ok(Json(overrides))
}

pub async fn set_override_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<SetOverrideRequest>,
) -> ApiResult<Json<GranularOverrideResponse>> {
    let entry = payload.into_override(user.tenant_id())?;
    let stored = state
        .granular_matrix_service
        .set_override(
            &user,
            entry.resource(),
            entry.job_role(),
            entry.actions().clone(),
        )
        .await?;

    Ok(Json(GranularOverrideResponse::from(stored)))
}

pub async fn delete_override_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<OverrideKeyQuery>,
) -> ApiResult<StatusCode> {
    let removed = state
        .granular_matrix_service
        .delete_override(&user, query.resource.parse()?, query.job_role.parse()?)
        .await?;

    if !removed {
        return Err(AppError::NotFound(format!(
            "no override for '{}' and job role '{}'",
            query.resource, query.job_role
        ))
        .into());
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn preview_overrides_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<PreviewOverridesRequest>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let preview = state
        .granular_matrix_service
        .preview(&user, payload.into_preview(user.tenant_id())?)
        .await?;

    Ok(Json(preview.into()))
}

pub async fn apply_override_changes_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<ApplyOverrideChangesRequest>,
) -> ApiResult<Json<ApplyOverrideChangesResponse>> {
    let changes = payload
        .changes
        .into_iter()
        .map(|change| change.into_change(user.tenant_id()))
        .collect::<Result<Vec<_>, _>>()?;

    let applied = state
        .granular_matrix_service
        .apply_override_changes(&user, changes.clone())
        .await?;

    Ok(Json(ApplyOverrideChangesResponse {
        changes: changes.into_iter().map(Into::into).collect(),
        applied,
    }))
}

/// Replaces the workshop's override table with the desired one by submitting
/// only the difference.
pub async fn sync_overrides_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<SyncOverridesRequest>,
) -> ApiResult<Json<ApplyOverrideChangesResponse>> {
    let desired = payload
        .desired
        .into_iter()
        .map(|entry| entry.into_override(user.tenant_id()))
        .collect::<Result<Vec<_>, _>>()?;

    let snapshot = state
        .granular_matrix_service
        .list_overrides(&user, None)
        .await?;
    let changes = diff_overrides(&snapshot, &desired);
    let applied = state
        .granular_matrix_service
        .apply_override_changes(&user, changes.clone())
        .await?;

    Ok(Json(ApplyOverrideChangesResponse {
        changes: changes.into_iter().map(Into::into).collect(),
        applied,
    }))
}

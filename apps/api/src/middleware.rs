use atelier_core::{AppError, TenantId, UserIdentity};
use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiResult;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Reads the caller identity set by the upstream identity provider.
pub async fn require_identity(mut request: Request, next: Next) -> ApiResult<Response> {
    let identity = identity_from_headers(request.headers())?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub(crate) fn identity_from_headers(headers: &HeaderMap) -> Result<UserIdentity, AppError> {
    let tenant_id = header_value(headers, TENANT_HEADER)?
        .ok_or_else(|| AppError::Unauthorized(format!("missing {TENANT_HEADER} header")))?;
    let tenant_id = TenantId::parse(tenant_id)?;

    let user_id = header_value(headers, USER_ID_HEADER)?
        .ok_or_else(|| AppError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?;

    UserIdentity::parse(
        user_id,
        header_value(headers, USER_NAME_HEADER)?,
        header_value(headers, USER_EMAIL_HEADER)?,
        tenant_id,
    )
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AppError> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| AppError::Validation(format!("{name} header is not valid text")))
        })
        .transpose()
}

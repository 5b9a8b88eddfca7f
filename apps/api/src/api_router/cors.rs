use atelier_core::AppError;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

use crate::middleware::{TENANT_HEADER, USER_EMAIL_HEADER, USER_ID_HEADER, USER_NAME_HEADER};

pub(super) fn build_cors_layer(frontend_url: &str) -> Result<CorsLayer, AppError> {
    Ok(CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Validation(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(TENANT_HEADER),
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(USER_EMAIL_HEADER),
            HeaderName::from_static(USER_NAME_HEADER),
        ]))
}

mod types;

use atelier_application::AccessControlError;
use atelier_core::{AppError, ErrorCategory};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

pub use types::ErrorResponse;

/// HTTP API error carrying the category and the specific message.
#[derive(Debug)]
pub struct ApiError {
    category: ErrorCategory,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.category {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Conflict => StatusCode::CONFLICT,
            ErrorCategory::State => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCategory::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCategory::Forbidden => StatusCode::FORBIDDEN,
            ErrorCategory::Dependency => StatusCode::BAD_GATEWAY,
            ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self {
            category: value.category(),
            message: value.to_string(),
        }
    }
}

impl From<AccessControlError> for ApiError {
    fn from(value: AccessControlError) -> Self {
        Self {
            category: value.category(),
            message: value.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(category = self.category.as_str(), message = %self.message, "request failed");
        }

        let payload = Json(ErrorResponse::new(self.message, self.category.as_str()));
        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

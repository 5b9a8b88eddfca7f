use serde::Serialize;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    message: String,
    category: String,
}

impl ErrorResponse {
    pub(super) fn new(message: String, category: &str) -> Self {
        Self {
            message,
            category: category.to_owned(),
        }
    }
}

//! Mapping of pipeline errors onto HTTP responses.

use audit::AuditError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// API-facing error wrapper.
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        let status = match &err {
            AuditError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AuditError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuditError::TextTooLong { .. } | AuditError::PayloadTooLarge { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            AuditError::ExtractionExhausted { .. } => StatusCode::BAD_GATEWAY,
            AuditError::Rules(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // The client went away; any 4xx is unobserved anyway.
            AuditError::Cancelled => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

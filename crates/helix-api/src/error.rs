//! API error types and HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use helix_core::Error as CoreError;
use helix_flow::Error as FlowError;

/// API result type.
pub type ApiResult<T> = Result<T, ApiError>;

/// JSON error response body.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ApiErrorBody {
    /// Human-readable message (safe for clients).
    pub msg: String,
}

/// HTTP API error.
///
/// Internal errors always render the same generic body; the real cause is
/// logged server-side and never echoed to clients.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Returns an error response for invalid input.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Returns an internal error response with a generic client-facing body.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(detail = %detail, "internal error");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_string(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the client-facing error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiErrorBody { msg: self.message }),
        )
            .into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidId { message } => Self::bad_request(message),
            CoreError::InvalidInput(message) => Self::bad_request(message),
            other => Self::internal(other),
        }
    }
}

// Event handlers surface every pipeline error as a 5xx so the bus redelivers.
impl From<FlowError> for ApiError {
    fn from(value: FlowError) -> Self {
        Self::internal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_echoes_message() {
        let error = ApiError::bad_request("token is required");
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.message(), "token is required");
    }

    #[test]
    fn internal_hides_detail() {
        let error = ApiError::internal("bucket credentials expired");
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message(), "internal error");
    }

    #[test]
    fn core_invalid_input_maps_to_bad_request() {
        let error: ApiError = CoreError::InvalidInput("bad key".to_string()).into();
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn core_storage_maps_to_internal() {
        let error: ApiError = CoreError::storage("transient put failure").into();
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message(), "internal error");
    }
}

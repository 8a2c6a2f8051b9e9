//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use smarthome_domain::error::{SmartHomeError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`SmartHomeError`] to an HTTP response with appropriate status code.
pub struct ApiError(SmartHomeError);

impl From<SmartHomeError> for ApiError {
    fn from(err: SmartHomeError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            SmartHomeError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            SmartHomeError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            SmartHomeError::TypeMismatch(err) => (StatusCode::CONFLICT, err.to_string()),
            SmartHomeError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

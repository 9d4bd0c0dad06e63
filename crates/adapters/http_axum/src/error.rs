//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use flotilla_domain::error::FlotillaError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    rolled_back: bool,
}

/// Maps [`FlotillaError`] to an HTTP response with appropriate status code.
pub struct ApiError(FlotillaError);

impl From<FlotillaError> for ApiError {
    fn from(err: FlotillaError) -> Self {
        Self(err)
    }
}

impl From<flotilla_domain::error::ValidationError> for ApiError {
    fn from(err: flotilla_domain::error::ValidationError) -> Self {
        Self(FlotillaError::Validation(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut rolled_back = false;
        let (status, message) = match &self.0 {
            FlotillaError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            FlotillaError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            FlotillaError::UnknownSession => (StatusCode::NOT_FOUND, self.0.to_string()),
            FlotillaError::ActivationInFlight | FlotillaError::ReorderInFlight => {
                (StatusCode::CONFLICT, self.0.to_string())
            }
            FlotillaError::ReorderRolledBack(_) => {
                rolled_back = true;
                (StatusCode::CONFLICT, self.0.to_string())
            }
            FlotillaError::PreviewFetch(_) | FlotillaError::Commit(_) => {
                (StatusCode::BAD_GATEWAY, self.0.to_string())
            }
            FlotillaError::Backend(err) => {
                tracing::error!(error = %err, "unclassified backend error");
                (StatusCode::BAD_GATEWAY, "backend request failed".to_string())
            }
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                rolled_back,
            }),
        )
            .into_response()
    }
}

//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use twintank_domain::error::TwinTankError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Status code and client-facing message for a domain error.
///
/// Store failures are logged here and hidden from the client.
pub(crate) fn status_of(err: &TwinTankError) -> (StatusCode, String) {
    match err {
        TwinTankError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
        TwinTankError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
        TwinTankError::RoleUnresolved(err) => (StatusCode::CONFLICT, err.to_string()),
        TwinTankError::StoreUnavailable(source) => {
            tracing::error!(error = %source, "device store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "device store unavailable".to_string(),
            )
        }
        TwinTankError::MalformedDevice(err) => {
            tracing::error!(error = %err, "malformed device record");
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
    }
}

/// Maps [`TwinTankError`] to an HTTP response with appropriate status code.
pub struct ApiError(TwinTankError);

impl From<TwinTankError> for ApiError {
    fn from(err: TwinTankError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = status_of(&self.0);
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

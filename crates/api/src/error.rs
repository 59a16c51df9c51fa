//! API error type rendering the shared structured error body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{ErrorKind, HttpErrorInfo, ServiceError};

/// API-level error carrying the request path for the error body.
///
/// Status mapping: 400 malformed key, 404 root not found, 422 domain
/// validation / duplicate key, 500 unexpected or unavailable backend.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    path: String,
    message: String,
}

impl ApiError {
    pub fn bad_request(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Maps a service error to its HTTP status, keeping the message intact.
    pub fn from_service(err: ServiceError, path: impl Into<String>) -> Self {
        let status = match err.kind() {
            ErrorKind::InvalidInput => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unavailable | ErrorKind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            path: path.into(),
            message: err.message().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(path = %self.path, message = %self.message, "request failed");
        }
        let body = HttpErrorInfo::new(
            self.path,
            self.status.as_u16(),
            self.status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            self.message,
        );
        (self.status, Json(body)).into_response()
    }
}

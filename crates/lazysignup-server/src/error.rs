//! HTTP mapping for [`LazySignupError`].
//!
//! Every error response carries a stable code and a message:
//!
//! ```json
//! {"code": "PERMISSION_DENIED", "message": "Authorization denied: user is not a lazy user"}
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lazysignup_core::error::LazySignupError;
use tracing::error;

#[derive(Debug)]
pub struct ApiError(pub LazySignupError);

impl From<LazySignupError> for ApiError {
    fn from(err: LazySignupError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match &self.0 {
            LazySignupError::NotFound { .. } => "NOT_FOUND",
            LazySignupError::AlreadyExists { .. } => "ALREADY_EXISTS",
            LazySignupError::AuthenticationFailed { .. } => "UNAUTHENTICATED",
            LazySignupError::AuthorizationDenied { .. } => "PERMISSION_DENIED",
            LazySignupError::Validation { .. } => "VALIDATION_FAILED",
            LazySignupError::ResourceExhausted(_) => "RESOURCE_EXHAUSTED",
            LazySignupError::Configuration(_) => "CONFIGURATION_ERROR",
            LazySignupError::Database(_) => "STORAGE_ERROR",
            LazySignupError::Crypto(_) | LazySignupError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            LazySignupError::NotFound { .. } => StatusCode::NOT_FOUND,
            LazySignupError::AlreadyExists { .. } => StatusCode::CONFLICT,
            LazySignupError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            LazySignupError::AuthorizationDenied { .. } => StatusCode::FORBIDDEN,
            LazySignupError::Validation { .. } => StatusCode::BAD_REQUEST,
            LazySignupError::ResourceExhausted(_)
            | LazySignupError::Configuration(_)
            | LazySignupError::Database(_)
            | LazySignupError::Crypto(_)
            | LazySignupError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self.0, code = self.error_code(), "Request failed");
        }
        let body = serde_json::json!({
            "code": self.error_code(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use deviceadm_core::RequestContext;
use deviceadm_core::error::{AppError, ErrorKind};

/// Message returned in place of any infrastructure failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Human-readable message.
    pub error: String,
    /// Correlation ID of the failed request.
    pub request_id: String,
}

/// An application error bound to the request it failed.
#[derive(Debug)]
pub struct ApiError {
    /// The underlying error.
    pub error: AppError,
    /// Correlation ID echoed in the body.
    pub request_id: String,
}

impl ApiError {
    /// Bind `error` to a request.
    pub fn new(error: AppError, request_id: impl Into<String>) -> Self {
        Self {
            error,
            request_id: request_id.into(),
        }
    }

    /// Status code for the error kind.
    pub fn status(&self) -> StatusCode {
        match self.error.kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Conflict | ErrorKind::NotPreauthorized => StatusCode::CONFLICT,
            ErrorKind::ExternalService
            | ErrorKind::Database
            | ErrorKind::Configuration
            | ErrorKind::Serialization
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(
                request_id = %self.request_id,
                kind = %self.error.kind,
                error = %self.error,
                source = ?self.error.source,
                "Internal server error"
            );
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            tracing::warn!(
                request_id = %self.request_id,
                kind = %self.error.kind,
                "{}",
                self.error.message
            );
            self.error.message
        };

        let body = ApiErrorResponse {
            error: message,
            request_id: self.request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Attach the request correlation ID to a failed result.
pub trait ResultExt<T> {
    /// Convert the error into an [`ApiError`] for the request of `ctx`.
    fn or_api(self, ctx: &RequestContext) -> Result<T, ApiError>;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn or_api(self, ctx: &RequestContext) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::new(e, ctx.request_id.clone()))
    }
}

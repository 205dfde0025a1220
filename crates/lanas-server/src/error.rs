//! HTTP error types for the Lanas server.
//!
//! Maps domain errors from `lanas-core` into HTTP responses. Every error
//! produces a JSON body with a machine-readable `error` field and a
//! human-readable `message`; validation failures add the `issues` list.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use lanas_core::error::{FieldIssue, FormError, LeadStoreError, ValidationError};

use crate::sessions::SessionError;

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Authentication missing or token unknown.
    Unauthorized(String),
    /// Authenticated but not allowed.
    Forbidden(String),
    /// Requested resource not found.
    NotFound(String),
    /// Client sent malformed input.
    BadRequest(String),
    /// The form answers do not pass validation.
    Validation(ValidationError),
    /// Conflicting concurrent operation.
    Conflict(String),
    /// Internal server error. The message is shown to clients as-is, so it
    /// must not carry storage details.
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    issues: Vec<FieldIssue>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut step = None;
        let mut issues = Vec::new();
        let (status, error_type, message) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Validation(err) => {
                if let ValidationError::Step { step: n, .. } = &err {
                    step = Some(*n);
                }
                issues = err.issues().to_vec();
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "validation_failed",
                    err.to_string(),
                )
            }
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorBody {
            error: error_type,
            message,
            step,
            issues,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::UnknownField { .. } => Self::NotFound(err.to_string()),
            FormError::WrongKind { .. } => Self::BadRequest(err.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound { .. } => Self::NotFound(err.to_string()),
            SessionError::Busy { .. } => Self::Conflict(err.to_string()),
        }
    }
}

impl From<LeadStoreError> for AppError {
    fn from(err: LeadStoreError) -> Self {
        tracing::error!(error = %err, "lead storage failure");
        Self::Internal("lead storage is unavailable, please try again".to_owned())
    }
}

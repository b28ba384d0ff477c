//! Secure Error Handling
//!
//! Error responses that keep internal details out of client-visible bodies
//! while preserving full context in the logs.
//!
//! Business outcomes (unknown user, wrong password, duplicate username) are
//! ordinary 4xx responses with a short message. Token faults all collapse to
//! a uniform 401 at the boundary; the concrete kind is logged where the
//! verification happens, never echoed to the client. Infrastructure failures
//! (store unreachable, hashing failure) become a generic 500 with the source
//! recorded in the log only.

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::validation::ValidationErrors;

/// Application error type with secure response handling
#[derive(Debug)]
pub struct AppError {
    /// Error kind determines HTTP status and handling
    pub kind: ErrorKind,
    /// Message safe to show to clients
    pub message: String,
    /// Per-field validation errors (only for `ErrorKind::Validation`)
    pub fields: Option<BTreeMap<String, String>>,
    /// Internal details (logged, never exposed)
    details: Option<String>,
    /// Seconds a locked-out caller should wait (only for `ErrorKind::Locked`)
    retry_after: Option<u64>,
}

/// Error categories with their HTTP status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request (400) - structural validation failure
    Validation,
    /// Unauthorized (401) - no valid session
    Unauthorized,
    /// Forbidden (403) - rejected business outcome
    Forbidden,
    /// Not found (404) - resource doesn't exist
    NotFound,
    /// Conflict (409) - resource state conflict
    Conflict,
    /// Unprocessable entity (422) - content rejected
    Unsupported,
    /// Too many requests (429) - login lockout
    Locked,
    /// Internal server error (500) - details hidden
    Internal,
}

impl ErrorKind {
    /// Get the HTTP status code for this error kind
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Unsupported => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Locked => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: None,
            details: None,
            retry_after: None,
        }
    }

    /// Create a validation error (400) with a per-field error map
    pub fn validation(errors: ValidationErrors) -> Self {
        let fields = errors
            .into_iter()
            .map(|e| (e.field, e.message))
            .collect::<BTreeMap<_, _>>();
        Self {
            fields: Some(fields),
            ..Self::new(ErrorKind::Validation, "Invalid request.")
        }
    }

    /// Create a validation error (400) without field context
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create an unauthorized error (401)
    ///
    /// The message is fixed: every gate rejection looks the same to the
    /// client regardless of why the token failed.
    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized, "Unauthorized.")
    }

    /// Create a forbidden error (403)
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a not found error (404)
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a conflict error (409)
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an unprocessable-content error (422)
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    /// Create a lockout error (429) with the remaining wait
    pub fn locked_out(seconds_remaining: u64) -> Self {
        Self {
            retry_after: Some(seconds_remaining),
            ..Self::new(
                ErrorKind::Locked,
                format!("Too many failed attempts. Try again in {} seconds.", seconds_remaining),
            )
        }
    }

    /// Create an internal error (500) - details are logged, not exposed
    pub fn internal(details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(ErrorKind::Internal, "An internal error occurred.")
        }
    }

    /// Log the error (called by `IntoResponse`)
    fn log(&self) {
        let details = self.details.as_deref().unwrap_or("none");

        match self.kind {
            ErrorKind::Internal => {
                tracing::error!(
                    error_kind = ?self.kind,
                    message = %self.message,
                    details = %details,
                    "Internal error"
                );
            }
            ErrorKind::Unauthorized | ErrorKind::Locked => {
                tracing::warn!(
                    error_kind = ?self.kind,
                    message = %self.message,
                    "Auth error"
                );
            }
            _ => {
                tracing::debug!(
                    error_kind = ?self.kind,
                    message = %self.message,
                    "Client error"
                );
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.status_code(), self.message)
    }
}

impl std::error::Error for AppError {}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::validation(errors)
    }
}

/// JSON error response format
///
/// The `message` field is the stable wire contract; `errors` only appears on
/// validation failures.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.kind.status_code();
        let body = ErrorResponse {
            message: self.message,
            errors: self.fields,
        };

        match self.retry_after {
            Some(secs) => (
                status,
                [(header::RETRY_AFTER, secs.to_string())],
                Json(body),
            )
                .into_response(),
            None => (status, Json(body)).into_response(),
        }
    }
}

/// Result type alias for handlers returning AppError
pub type Result<T> = std::result::Result<T, AppError>;

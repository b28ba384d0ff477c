//! Input Validation
//!
//! Structural validation for request payloads. Every user-supplied field is
//! checked before any store or hashing work happens; violations are collected
//! per field and rendered as one 400 response, so a client fixing a form sees
//! every problem at once rather than one per round trip.
//!
//! # Usage
//!
//! ```ignore
//! use chat_backend::validation::{Validate, ValidationErrors, validate_required, validate_max_length};
//!
//! struct Signup {
//!     username: String,
//!     password: String,
//! }
//!
//! impl Validate for Signup {
//!     fn validate(&self) -> Result<(), ValidationErrors> {
//!         let mut errors = ValidationErrors::new();
//!         errors.check(validate_required(&self.username, "username"));
//!         errors.check(validate_max_length(&self.username, 30, "username"));
//!         errors.check(validate_required(&self.password, "password"));
//!         errors.check(validate_max_length(&self.password, 100, "password"));
//!         errors.into_result()
//!     }
//! }
//! ```

use std::fmt;

use axum::extract::{FromRequest, Request};
use axum::Json;

use crate::error::AppError;

/// Validation error with field context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Human-readable message
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for a specific field
    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Collection of per-field validation errors
#[derive(Debug, Clone, Default)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Create an empty collection
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Record an error
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Record the error of a failed check, if any
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(error) = result {
            self.0.push(error);
        }
    }

    /// Whether any violations were recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert into `Err(self)` when violations were recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Trait for validatable request types
pub trait Validate {
    /// Validate the instance, returning every violation found
    fn validate(&self) -> Result<(), ValidationErrors>;
}

// ============================================================================
// String Validators
// ============================================================================

/// Validate that a string is not empty
pub fn validate_required(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::for_field(field, "Field is required"));
    }
    Ok(())
}

/// Validate an upper length bound, counted in characters
pub fn validate_max_length(value: &str, max: usize, field: &str) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::for_field(
            field,
            format!("Must be at most {} characters", max),
        ));
    }
    Ok(())
}

// ============================================================================
// Axum Extractor
// ============================================================================

/// JSON extractor that runs [`Validate`] before the handler sees the value.
///
/// A body that fails to deserialize or validate never reaches handler code.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: serde::de::DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|_| AppError::bad_request("Invalid request body."))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert!(validate_required("alice", "username").is_ok());
        assert!(validate_required("", "username").is_err());
        assert!(validate_required("   ", "username").is_err());
    }

    #[test]
    fn test_max_length() {
        assert!(validate_max_length("alice", 30, "username").is_ok());
        assert!(validate_max_length(&"x".repeat(30), 30, "username").is_ok());
        assert!(validate_max_length(&"x".repeat(31), 30, "username").is_err());
    }

    #[test]
    fn test_max_length_counts_chars_not_bytes() {
        // Four multi-byte characters are still four characters.
        assert!(validate_max_length("日本語字", 4, "username").is_ok());
    }

    #[test]
    fn test_errors_collect_all_violations() {
        let mut errors = ValidationErrors::new();
        errors.check(validate_required("", "username"));
        errors.check(validate_required("", "password"));

        let collected: Vec<_> = errors.into_iter().collect();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].field, "username");
        assert_eq!(collected[1].field, "password");
    }

    #[test]
    fn test_empty_errors_are_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}

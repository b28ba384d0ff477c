//! Password Hashing
//!
//! One-way credential transform built on Argon2id. The encoded output is a
//! self-describing PHC string (algorithm, parameters, salt, digest), so cost
//! parameters can be raised later without invalidating hashes already in the
//! store: verification always re-derives with the parameters embedded in the
//! hash under test.
//!
//! Digest comparison inside the argon2 verifier is constant time; a wrong
//! password is a normal `Ok(false)`, never an error. The only error paths
//! are entropy/resource failure on hashing and an unrecognized encoding on
//! verification.

use std::fmt;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;

/// Hashing failed (entropy source or resource exhaustion)
#[derive(Debug)]
pub struct HashError(String);

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "password hashing failed: {}", self.0)
    }
}

impl std::error::Error for HashError {}

/// The stored hash is not a recognized PHC encoding
#[derive(Debug)]
pub struct VerifyError(String);

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stored password hash is malformed: {}", self.0)
    }
}

impl std::error::Error for VerifyError {}

/// Hash a password with Argon2id, a fresh random salt, and default cost
/// parameters.
///
/// Accepts arbitrary input, including the empty string; length bounds are
/// the caller's validation concern. Two calls with the same input produce
/// different encodings (distinct salts) that both verify.
pub fn hash(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| HashError(e.to_string()))
}

/// Verify a candidate password against a stored PHC-encoded hash.
///
/// Returns `Ok(false)` for a wrong password. `Err` means the encoded hash
/// itself could not be interpreted, which indicates store corruption rather
/// than a bad credential.
pub fn verify(encoded: &str, candidate: &str) -> Result<bool, VerifyError> {
    let parsed = PasswordHash::new(encoded).map_err(|e| VerifyError(e.to_string()))?;

    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(VerifyError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verifies_own_input() {
        let encoded = hash("correct-horse").unwrap();
        assert!(verify(&encoded, "correct-horse").unwrap());
    }

    #[test]
    fn test_wrong_password_is_false_not_error() {
        let encoded = hash("correct-horse").unwrap();
        assert!(!verify(&encoded, "battery-staple").unwrap());
    }

    #[test]
    fn test_distinct_salts() {
        let a = hash("same-input").unwrap();
        let b = hash("same-input").unwrap();
        assert_ne!(a, b);
        assert!(verify(&a, "same-input").unwrap());
        assert!(verify(&b, "same-input").unwrap());
    }

    #[test]
    fn test_empty_password_accepted() {
        let encoded = hash("").unwrap();
        assert!(verify(&encoded, "").unwrap());
        assert!(!verify(&encoded, "nonempty").unwrap());
    }

    #[test]
    fn test_encoding_is_self_describing() {
        let encoded = hash("anything").unwrap();
        assert!(encoded.starts_with("$argon2id$"));
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify("not-a-phc-string", "anything").is_err());
        assert!(verify("", "anything").is_err());
    }
}

//! Session Token Service
//!
//! Issues and verifies signed, purpose-bound, time-limited tokens with a
//! process-wide Ed25519 keypair. The keypair is an explicitly constructed
//! value handed to [`TokenService::new`] once at startup and held immutably
//! for the process lifetime; nothing reaches it through globals.
//!
//! Wire format: `base64url(claims JSON) . base64url(signature)`, where the
//! signature covers the exact claims bytes. Ed25519 is non-randomized, so
//! issuing twice with identical claims yields identical tokens.
//!
//! Verification applies zero clock-skew leeway: a token is valid only while
//! the current instant lies within `[iat, exp)`, and a future `iat` is
//! rejected outright as malformed.

use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Semantic use a token is minted for.
///
/// A token only verifies against the purpose it was issued with, so a token
/// minted for one function can never be replayed into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Session authentication (the cookie-borne login token)
    Session,
}

impl Purpose {
    /// The tag embedded in the claims
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "session",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// The purpose travels as a plain string so a token minted elsewhere with an
// unknown tag still parses and is rejected as a mismatch, not as garbage.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    purpose: String,
    iat: i64,
    exp: i64,
}

/// Token issuance failed.
///
/// Only claims serialization can fail here, which does not occur for
/// well-formed claims; the variant exists so the error path is explicit
/// rather than a panic.
#[derive(Debug)]
pub struct IssueError(String);

impl fmt::Display for IssueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token issuance failed: {}", self.0)
    }
}

impl std::error::Error for IssueError {}

/// Distinct verification failures.
///
/// Callers log the kind for observability; the HTTP boundary collapses all
/// of them into one unauthorized response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    /// Not structurally a token, undecodable, or future-dated
    Malformed,
    /// Structure is fine but the signature does not verify
    InvalidSignature,
    /// Signed for a different purpose than expected
    PurposeMismatch,
    /// The current instant is at or past `exp`
    Expired,
}

impl VerifyError {
    /// Stable kind string for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::InvalidSignature => "invalid_signature",
            Self::PurposeMismatch => "purpose_mismatch",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

impl std::error::Error for VerifyError {}

/// Issues and verifies session tokens with one Ed25519 keypair.
pub struct TokenService {
    signing: SigningKey,
    verifying: VerifyingKey,
}

impl TokenService {
    /// Construct the service around an explicit signing key.
    ///
    /// The verification half is derived here; both halves live for the
    /// lifetime of the service and are never rotated.
    pub fn new(signing: SigningKey) -> Self {
        let verifying = signing.verifying_key();
        Self { signing, verifying }
    }

    /// Construct from the 32-byte secret seed (the `PRIVATE_KEY` material).
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::new(SigningKey::from_bytes(seed))
    }

    /// Issue a signed token for `subject`, valid for `lifetime` from now.
    pub fn issue(
        &self,
        subject: Uuid,
        lifetime: Duration,
        purpose: Purpose,
    ) -> Result<String, IssueError> {
        self.issue_at(subject, lifetime, purpose, Utc::now().timestamp())
    }

    fn issue_at(
        &self,
        subject: Uuid,
        lifetime: Duration,
        purpose: Purpose,
        iat: i64,
    ) -> Result<String, IssueError> {
        let claims = Claims {
            sub: subject,
            purpose: purpose.as_str().to_string(),
            iat,
            exp: iat + lifetime.as_secs() as i64,
        };
        let payload = serde_json::to_vec(&claims).map_err(|e| IssueError(e.to_string()))?;
        let signature = self.signing.sign(&payload);

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }

    /// Verify a token and return its subject.
    ///
    /// Checks, in order: structure, signature against the public key,
    /// purpose equality, and that the current instant is within
    /// `[iat, exp)`.
    pub fn verify(&self, token: &str, expected: Purpose) -> Result<Uuid, VerifyError> {
        self.verify_at(token, expected, Utc::now().timestamp())
    }

    fn verify_at(&self, token: &str, expected: Purpose, now: i64) -> Result<Uuid, VerifyError> {
        let (payload_b64, signature_b64) =
            token.split_once('.').ok_or(VerifyError::Malformed)?;
        if signature_b64.contains('.') {
            return Err(VerifyError::Malformed);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| VerifyError::Malformed)?;
        let signature_bytes = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| VerifyError::Malformed)?;
        let signature =
            Signature::from_slice(&signature_bytes).map_err(|_| VerifyError::Malformed)?;

        self.verifying
            .verify_strict(&payload, &signature)
            .map_err(|_| VerifyError::InvalidSignature)?;

        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| VerifyError::Malformed)?;

        if claims.purpose != expected.as_str() {
            return Err(VerifyError::PurposeMismatch);
        }
        if claims.iat > now {
            // Future-dated tokens are not a supported state.
            return Err(VerifyError::Malformed);
        }
        if now >= claims.exp {
            return Err(VerifyError::Expired);
        }

        Ok(claims.sub)
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The signing half must never end up in logs.
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

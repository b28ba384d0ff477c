//! Credential Verification & Registration
//!
//! Stateless orchestration between the user store and the password hasher.
//! Business outcomes (unknown user, wrong password, duplicate username) are
//! explicit variants; only infrastructure failures travel as errors the
//! boundary turns into a 500.

use std::fmt;
use std::sync::Arc;

use crate::auth::password;
use crate::avatar;
use crate::store::{Account, NewAccount, StoreError, UserStore};

/// Why an authentication attempt was rejected
#[derive(Debug)]
pub enum AuthenticateError {
    /// No account with the submitted username
    UnknownUser,
    /// The account exists but the password does not match
    WrongPassword,
    /// The store failed
    Store(StoreError),
    /// The stored hash could not be interpreted
    BadHash(password::VerifyError),
}

impl fmt::Display for AuthenticateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownUser => write!(f, "unknown user"),
            Self::WrongPassword => write!(f, "wrong password"),
            Self::Store(e) => write!(f, "store error: {}", e),
            Self::BadHash(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AuthenticateError {}

/// Why a registration attempt was rejected
#[derive(Debug)]
pub enum RegisterError {
    /// An account with the submitted username already exists
    AlreadyExists,
    /// The store failed
    Store(StoreError),
    /// Password hashing failed
    Hash(password::HashError),
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists => write!(f, "username already exists"),
            Self::Store(e) => write!(f, "store error: {}", e),
            Self::Hash(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RegisterError {}

/// Credential verifier and account registrar
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
}

impl AccountService {
    /// Create the service over the injected store
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Does `(username, password)` identify a valid account?
    ///
    /// One store lookup, one hash verification, no other I/O.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Account, AuthenticateError> {
        let account = self
            .store
            .find_by_username(username)
            .await
            .map_err(AuthenticateError::Store)?
            .ok_or(AuthenticateError::UnknownUser)?;

        let matched = password::verify(&account.password_hash, password)
            .map_err(AuthenticateError::BadHash)?;
        if !matched {
            return Err(AuthenticateError::WrongPassword);
        }

        Ok(account)
    }

    /// Register a new account with a hashed password and a default avatar.
    ///
    /// The existence pre-check keeps the common duplicate case cheap, but it
    /// is not atomic against concurrent signups: the store's uniqueness
    /// constraint is the source of truth, and its conflict error resolves to
    /// the same outcome as the pre-check.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Account, RegisterError> {
        let existing = self
            .store
            .find_by_username(username)
            .await
            .map_err(RegisterError::Store)?;
        if existing.is_some() {
            return Err(RegisterError::AlreadyExists);
        }

        let password_hash = password::hash(password).map_err(RegisterError::Hash)?;

        let created = self
            .store
            .insert(NewAccount {
                username: username.to_string(),
                password_hash,
                avatar: Some(avatar::random_default_avatar().to_string()),
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict => RegisterError::AlreadyExists,
                other => RegisterError::Store(other),
            })?;

        Ok(created)
    }
}

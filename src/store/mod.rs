//! User Record Store
//!
//! The persistence seam for accounts. The rest of the application only sees
//! the [`UserStore`] trait; the concrete backend is chosen at startup
//! (PostgreSQL behind the `postgres` feature, in-memory otherwise).
//!
//! Username uniqueness is the store's responsibility: callers may pre-check
//! existence, but the authoritative answer for two racing inserts is the
//! store's constraint, surfaced as [`StoreError::Conflict`].

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::InMemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;

/// A stored user account.
///
/// `password_hash` is the PHC-encoded argon2 output; plaintext never reaches
/// this type. The identity key is assigned at insert and immutable after.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub avatar: Option<String>,
}

/// Partial update with explicit per-field presence.
///
/// Each field is independently optional; `None` leaves the stored value
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub avatar: Option<String>,
}

impl AccountUpdate {
    /// Whether the update would change anything
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password_hash.is_none() && self.avatar.is_none()
    }
}

/// Store operation errors
#[derive(Debug)]
pub enum StoreError {
    /// Uniqueness constraint violated (duplicate username)
    Conflict,
    /// The targeted account does not exist
    NotFound,
    /// The backend failed or is unreachable
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict => write!(f, "username already exists"),
            Self::NotFound => write!(f, "account not found"),
            Self::Unavailable(reason) => write!(f, "store unavailable: {}", reason),
        }
    }
}

impl std::error::Error for StoreError {}

/// The abstract user-record store consumed by the authentication engine.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up an account by its unique username
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    /// Look up an account by its identity key
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Insert a new account, assigning its identity key.
    ///
    /// Returns [`StoreError::Conflict`] when the username is already taken,
    /// including when a concurrent insert won the race after the caller's
    /// existence pre-check.
    async fn insert(&self, new: NewAccount) -> Result<Account, StoreError>;

    /// Apply a partial update to an existing account
    async fn update(&self, id: Uuid, update: AccountUpdate) -> Result<(), StoreError>;

    /// Delete an account
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

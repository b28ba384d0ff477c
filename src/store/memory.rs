//! In-memory user store
//!
//! Backs tests and keyless local development. Uniqueness is enforced under a
//! single write lock, so the check-then-insert race the external database
//! resolves with a constraint is resolved here by lock exclusivity, with the
//! same [`StoreError::Conflict`] surface.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{Account, AccountUpdate, NewAccount, StoreError, UserStore};

/// In-memory [`UserStore`] implementation
#[derive(Debug, Default)]
pub struct InMemoryStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts (test helper)
    pub fn len(&self) -> usize {
        self.accounts.read().unwrap().len()
    }

    /// Whether the store holds no accounts
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().unwrap();
        Ok(accounts.values().find(|a| a.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().unwrap();
        Ok(accounts.get(&id).cloned())
    }

    async fn insert(&self, new: NewAccount) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().unwrap();

        if accounts.values().any(|a| a.username == new.username) {
            return Err(StoreError::Conflict);
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            username: new.username,
            password_hash: new.password_hash,
            avatar: new.avatar,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update(&self, id: Uuid, update: AccountUpdate) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().unwrap();

        if let Some(ref username) = update.username {
            if accounts.values().any(|a| a.username == *username && a.id != id) {
                return Err(StoreError::Conflict);
            }
        }

        let account = accounts.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(username) = update.username {
            account.username = username;
        }
        if let Some(password_hash) = update.password_hash {
            account.password_hash = password_hash;
        }
        if let Some(avatar) = update.avatar {
            account.avatar = Some(avatar);
        }
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().unwrap();
        accounts.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

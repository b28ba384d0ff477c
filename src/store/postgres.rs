//! PostgreSQL user store
//!
//! `sqlx`-backed [`UserStore`] with conservative pool settings. The `users`
//! table carries the unique index on `username` that makes the signup
//! check-then-insert race safe; a `23505` unique violation from any write is
//! translated to [`StoreError::Conflict`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;
use uuid::Uuid;

use super::{Account, AccountUpdate, NewAccount, StoreError, UserStore};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
    id         UUID PRIMARY KEY,
    username   VARCHAR(30) NOT NULL UNIQUE,
    password   TEXT NOT NULL,
    avatar     TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
)";

/// PostgreSQL [`UserStore`] implementation
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database and ensure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        info!("User store connected");
        Ok(Self { pool })
    }

    /// Wrap an existing pool (shared with other subsystems)
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    password: String,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            username: row.username,
            password_hash: row.password,
            avatar: row.avatar,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn map_store_err(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => StoreError::Conflict,
        _ => StoreError::Unavailable(e.to_string()),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        sqlx::query_as::<_, AccountRow>(
            "SELECT id, username, password, avatar, created_at, updated_at
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(Account::from))
        .map_err(map_store_err)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        sqlx::query_as::<_, AccountRow>(
            "SELECT id, username, password, avatar, created_at, updated_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(Account::from))
        .map_err(map_store_err)
    }

    async fn insert(&self, new: NewAccount) -> Result<Account, StoreError> {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            username: new.username,
            password_hash: new.password_hash,
            avatar: new.avatar,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO users (id, username, password, avatar, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.avatar)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_store_err)?;

        Ok(account)
    }

    async fn update(&self, id: Uuid, update: AccountUpdate) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET
                 username   = COALESCE($2, username),
                 password   = COALESCE($3, password),
                 avatar     = COALESCE($4, avatar),
                 updated_at = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(update.username)
        .bind(update.password_hash)
        .bind(update.avatar)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_store_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_store_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

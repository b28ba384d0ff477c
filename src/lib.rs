//! # chat-backend
//!
//! Account and session-authentication backend for the chat application.
//!
//! The security core is the credential & session authentication engine in
//! [`auth`]: Argon2id password hashing, Ed25519 session tokens bound to a
//! purpose and a one-hour lifetime, and the cookie-based session gate that
//! turns an inbound token into an authenticated identity. Around it sit the
//! user-record store seam ([`store`]), the avatar upload path ([`avatar`]),
//! and the profile HTTP surface ([`user`]).
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use chat_backend::{build_router, AppConfig, AppState};
//! use chat_backend::avatar::FsAvatarStore;
//! use chat_backend::store::InMemoryStore;
//!
//! let config = AppConfig::from_env()?;
//! let state = AppState::new(
//!     config,
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(FsAvatarStore::new("avatars", "/avatars")),
//! );
//! let app = build_router(state);
//! // axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod avatar;
pub mod config;
pub mod error;
pub mod observability;
pub mod router;
pub mod store;
pub mod user;
pub mod validation;

// Re-exports
pub use config::{AppConfig, ConfigError};
pub use error::{AppError, ErrorKind};
pub use router::{build_router, AppState};

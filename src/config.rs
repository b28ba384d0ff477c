//! Application Configuration
//!
//! Loads configuration from environment variables with documented defaults.
//! The signing seed is the one piece of secret material this process needs;
//! its absence (or malformation) is fatal at startup, never at request time.

use std::fmt;

/// Application configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: String,

    /// Production mode: hardens cookie transport (`HttpOnly` + `Secure`)
    pub production: bool,

    /// Ed25519 seed for the process-wide signing keypair
    pub signing_seed: [u8; 32],

    /// Session token lifetime in seconds
    pub session_lifetime_secs: u64,

    /// Browser origin allowed to send credentialed requests (CORS)
    pub client_url: Option<String>,

    /// PostgreSQL connection URL; absent means the in-memory store
    pub database_url: Option<String>,

    /// Maximum request body size in bytes
    pub max_request_size: usize,

    /// Directory avatar uploads are written to
    pub avatar_dir: String,

    /// Public URL prefix avatar uploads are served under
    pub avatar_public_base: String,
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    /// A required environment variable is not set
    Missing(&'static str),
    /// An environment variable is set but unusable
    Invalid { name: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "{} environment variable must be set", name),
            Self::Invalid { name, reason } => write!(f, "{} is invalid: {}", name, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PRIVATE_KEY`: 64 hex characters, the Ed25519 signing seed (required)
    /// - `PROD`: "true" enables production cookie attributes (default: false)
    /// - `BIND_ADDR`: listen address (default: "0.0.0.0:6060")
    /// - `SESSION_LIFETIME`: token lifetime in seconds (default: 3600)
    /// - `CLIENT_URL`: allowed CORS origin for the web client (default: none)
    /// - `DATABASE_URL`: PostgreSQL URL; unset selects the in-memory store
    /// - `MAX_REQUEST_SIZE`: body limit in bytes (default: 10485760, 10 MB)
    /// - `AVATAR_DIR`: upload directory (default: "avatars")
    /// - `AVATAR_PUBLIC_BASE`: public prefix for uploads (default: "/avatars")
    pub fn from_env() -> Result<Self, ConfigError> {
        let signing_seed = Self::seed_from_env()?;

        let production = std::env::var("PROD")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:6060".to_string());

        let session_lifetime_secs = match std::env::var("SESSION_LIFETIME") {
            Ok(s) => s.parse().map_err(|_| ConfigError::Invalid {
                name: "SESSION_LIFETIME",
                reason: "expected a number of seconds".to_string(),
            })?,
            Err(_) => 3600,
        };

        let max_request_size = match std::env::var("MAX_REQUEST_SIZE") {
            Ok(s) => s.parse().map_err(|_| ConfigError::Invalid {
                name: "MAX_REQUEST_SIZE",
                reason: "expected a number of bytes".to_string(),
            })?,
            Err(_) => 10 * 1024 * 1024,
        };

        let client_url = std::env::var("CLIENT_URL").ok().filter(|s| !s.is_empty());
        let database_url = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let avatar_dir = std::env::var("AVATAR_DIR").unwrap_or_else(|_| "avatars".to_string());
        let avatar_public_base =
            std::env::var("AVATAR_PUBLIC_BASE").unwrap_or_else(|_| "/avatars".to_string());

        Ok(Self {
            bind_addr,
            production,
            signing_seed,
            session_lifetime_secs,
            client_url,
            database_url,
            max_request_size,
            avatar_dir,
            avatar_public_base,
        })
    }

    /// Decode the `PRIVATE_KEY` seed.
    fn seed_from_env() -> Result<[u8; 32], ConfigError> {
        let raw = std::env::var("PRIVATE_KEY").map_err(|_| ConfigError::Missing("PRIVATE_KEY"))?;

        let bytes = hex::decode(raw.trim()).map_err(|_| ConfigError::Invalid {
            name: "PRIVATE_KEY",
            reason: "expected hex encoding".to_string(),
        })?;

        bytes.try_into().map_err(|_| ConfigError::Invalid {
            name: "PRIVATE_KEY",
            reason: "expected exactly 32 bytes (64 hex characters)".to_string(),
        })
    }
}

//! Security Event Logging
//!
//! Structured logging for security-relevant events. The application uses
//! standard `tracing` macros for ordinary diagnostics; anything that belongs
//! in an audit trail (authentication results, account changes, lockouts)
//! goes through [`SecurityEvent`] and the [`security_event!`] macro so every
//! record carries the same `security_event` / `category` / `severity` fields.
//!
//! # Usage
//!
//! ```ignore
//! use chat_backend::observability::SecurityEvent;
//! use chat_backend::security_event;
//!
//! security_event!(
//!     SecurityEvent::AuthenticationSuccess,
//!     user_id = %account.id,
//!     "User authenticated"
//! );
//! ```

use std::fmt;

/// Security event categories for audit logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    // Authentication events
    /// Successful user authentication
    AuthenticationSuccess,
    /// Failed authentication attempt
    AuthenticationFailure,
    /// Session cookie issued
    SessionCreated,
    /// Session cookie cleared (logout or account deletion)
    SessionDestroyed,

    // Authorization events
    /// Request rejected by the session gate
    AccessDenied,

    // User management events
    /// New account registered
    UserRegistered,
    /// Account fields modified
    UserModified,
    /// Account deleted
    UserDeleted,

    // Security events
    /// Username locked after repeated failed logins
    AccountLocked,

    // System events
    /// Application started
    SystemStartup,
}

impl SecurityEvent {
    /// Get the event category for filtering/grouping
    pub fn category(&self) -> &'static str {
        match self {
            Self::AuthenticationSuccess
            | Self::AuthenticationFailure
            | Self::SessionCreated
            | Self::SessionDestroyed => "authentication",

            Self::AccessDenied => "authorization",

            Self::UserRegistered | Self::UserModified | Self::UserDeleted => "user_management",

            Self::AccountLocked => "security",

            Self::SystemStartup => "system",
        }
    }

    /// Get the severity level for the event
    pub fn severity(&self) -> Severity {
        match self {
            Self::AuthenticationFailure | Self::AccessDenied | Self::AccountLocked => {
                Severity::High
            }

            Self::AuthenticationSuccess
            | Self::UserRegistered
            | Self::UserModified
            | Self::UserDeleted => Severity::Medium,

            Self::SessionCreated | Self::SessionDestroyed | Self::SystemStartup => Severity::Low,
        }
    }

    /// Get the event name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Self::AuthenticationSuccess => "authentication_success",
            Self::AuthenticationFailure => "authentication_failure",
            Self::SessionCreated => "session_created",
            Self::SessionDestroyed => "session_destroyed",
            Self::AccessDenied => "access_denied",
            Self::UserRegistered => "user_registered",
            Self::UserModified => "user_modified",
            Self::UserDeleted => "user_deleted",
            Self::AccountLocked => "account_locked",
            Self::SystemStartup => "system_startup",
        }
    }
}

impl fmt::Display for SecurityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Routine operations
    Low,
    /// Important state changes
    Medium,
    /// Security-relevant failures
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Log a security event with structured fields.
///
/// The macro automatically includes `security_event`, `category`, and
/// `severity` fields, routed to the tracing level matching the severity.
#[macro_export]
macro_rules! security_event {
    ($event:expr, $($field:tt)*) => {{
        let event = $event;
        let severity = event.severity();
        let category = event.category();
        let event_name = event.name();

        match severity {
            $crate::observability::Severity::High => {
                ::tracing::warn!(
                    security_event = event_name,
                    category = category,
                    severity = "high",
                    $($field)*
                );
            }
            $crate::observability::Severity::Medium => {
                ::tracing::info!(
                    security_event = event_name,
                    category = category,
                    severity = "medium",
                    $($field)*
                );
            }
            $crate::observability::Severity::Low => {
                ::tracing::debug!(
                    security_event = event_name,
                    category = category,
                    severity = "low",
                    $($field)*
                );
            }
        }
    }};
}

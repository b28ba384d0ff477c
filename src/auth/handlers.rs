//! Authentication Handlers
//!
//! Signup, login, and signout. Signup creates the account but establishes
//! no session; the client logs in separately. Login is where the session
//! token is minted and bound to the cookie. Signout overwrites the cookie
//! unconditionally and always succeeds.

use axum::{extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::auth::middleware::{removal_cookie, session_cookie, CurrentUser};
use crate::auth::service::{AuthenticateError, RegisterError};
use crate::auth::token::Purpose;
use crate::error::AppError;
use crate::observability::SecurityEvent;
use crate::router::AppState;
use crate::security_event;
use crate::validation::{
    validate_max_length, validate_required, Validate, ValidatedJson, ValidationErrors,
};

/// Username/password payload shared by signup and login
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

impl Validate for CredentialsRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_required(&self.username, "username"));
        errors.check(validate_max_length(&self.username, 30, "username"));
        errors.check(validate_required(&self.password, "password"));
        errors.check(validate_max_length(&self.password, 100, "password"));
        errors.into_result()
    }
}

/// POST /api/auth/signup - create an account
///
/// 201 on success with no session established. A duplicate username is a
/// 403 with no store mutation, whether it was caught by the pre-check or by
/// the store constraint under a concurrent signup.
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CredentialsRequest>,
) -> Result<StatusCode, AppError> {
    let account = state
        .accounts
        .register(&input.username, &input.password)
        .await
        .map_err(|e| match e {
            RegisterError::AlreadyExists => AppError::forbidden("User already exists."),
            RegisterError::Store(e) => AppError::internal(e.to_string()),
            RegisterError::Hash(e) => AppError::internal(e.to_string()),
        })?;

    security_event!(
        SecurityEvent::UserRegistered,
        user_id = %account.id,
        username = %account.username,
        "New account registered"
    );

    Ok(StatusCode::CREATED)
}

/// POST /api/auth/login - verify credentials and start a session
///
/// On success the session token (1 hour by default) is transported in the
/// `chat_app` cookie. Failed attempts are tracked per submitted username and
/// lock the name out after repeated failures.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(input): ValidatedJson<CredentialsRequest>,
) -> Result<(CookieJar, StatusCode), AppError> {
    if let Some(remaining) = state.logins.check_lockout(&input.username) {
        return Err(AppError::locked_out(remaining.as_secs().max(1)));
    }

    let account = match state
        .accounts
        .authenticate(&input.username, &input.password)
        .await
    {
        Ok(account) => account,
        Err(denied @ (AuthenticateError::UnknownUser | AuthenticateError::WrongPassword)) => {
            let outcome = state.logins.record_failure(&input.username);
            security_event!(
                SecurityEvent::AuthenticationFailure,
                username = %input.username,
                reason = %denied,
                failed_count = outcome.failed_count,
                "Login rejected"
            );

            if outcome.locked_out {
                let remaining = state
                    .logins
                    .check_lockout(&input.username)
                    .map(|d| d.as_secs())
                    .unwrap_or(1);
                return Err(AppError::locked_out(remaining.max(1)));
            }

            return Err(match denied {
                AuthenticateError::UnknownUser => AppError::forbidden("User not exists."),
                _ => AppError::forbidden("Password not correct."),
            });
        }
        Err(AuthenticateError::Store(e)) => return Err(AppError::internal(e.to_string())),
        Err(AuthenticateError::BadHash(e)) => return Err(AppError::internal(e.to_string())),
    };

    state.logins.record_success(&input.username);

    let token = state
        .tokens
        .issue(account.id, state.session_lifetime(), Purpose::Session)
        .map_err(|e| AppError::internal(e.to_string()))?;

    security_event!(
        SecurityEvent::AuthenticationSuccess,
        user_id = %account.id,
        username = %account.username,
        "User authenticated"
    );
    security_event!(
        SecurityEvent::SessionCreated,
        user_id = %account.id,
        "Session cookie issued"
    );

    let cookie = session_cookie(token, state.config.production);
    Ok((jar.add(cookie), StatusCode::OK))
}

/// POST /api/auth/signout - end the session
///
/// Stateless invalidation: the cookie is overwritten with an empty value
/// and a past expiry. The token itself is not revocable server-side; until
/// it expires, a copy the client kept would still verify. This is a known
/// limitation of cookie-only invalidation, accepted by design.
pub async fn signout(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    security_event!(
        SecurityEvent::SessionDestroyed,
        user_id = %user.0,
        "Session cookie cleared"
    );

    (jar.add(removal_cookie(state.config.production)), StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_validation_limits() {
        let ok = CredentialsRequest {
            username: "alice".to_string(),
            password: "correct-horse".to_string(),
        };
        assert!(ok.validate().is_ok());

        let empty = CredentialsRequest {
            username: String::new(),
            password: String::new(),
        };
        let errors: Vec<_> = empty.validate().unwrap_err().into_iter().collect();
        assert_eq!(errors.len(), 2);

        let long = CredentialsRequest {
            username: "x".repeat(31),
            password: "y".repeat(101),
        };
        let errors: Vec<_> = long.validate().unwrap_err().into_iter().collect();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("30"));
        assert!(errors[1].message.contains("100"));
    }
}

//! Session Gate
//!
//! The request-pipeline stage in front of every protected route. It pulls
//! the session token out of the `chat_app` cookie, verifies it against the
//! token service, and either binds the authenticated identity into the
//! request (PASS) or halts the pipeline with a uniform 401 (REJECT). No
//! state survives the request either way.
//!
//! The concrete verification failure (expired, malformed, wrong purpose,
//! bad signature) is logged with its kind but never distinguished to the
//! client, so responses carry no information about token structure.
//!
//! Cookie transport lives here too: `HttpOnly` and `Secure` are enabled in
//! production mode only (local development runs over plain HTTP),
//! `SameSite=Strict` always.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::auth::token::Purpose;
use crate::error::AppError;
use crate::observability::SecurityEvent;
use crate::router::AppState;
use crate::security_event;

/// Cookie the session token travels in
pub const SESSION_COOKIE: &str = "chat_app";

/// Authenticated identity bound by the gate.
///
/// Handlers take this as an extractor; it only exists in a request that
/// passed the gate, so downstream code never re-checks the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

/// Build the session cookie carrying a freshly issued token.
pub fn session_cookie(token: String, production: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Strict);
    cookie.set_http_only(production);
    cookie.set_secure(production);
    cookie
}

/// Build the removal cookie that overwrites the session.
///
/// Empty value, expiry in the past, same attributes as issuance so the
/// browser matches and drops the stored cookie.
pub fn removal_cookie(production: bool) -> Cookie<'static> {
    let mut cookie = session_cookie(String::new(), production);
    cookie.make_removal();
    cookie
}

/// Middleware enforcing an authenticated session on every wrapped route.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let jar = CookieJar::from_headers(request.headers());
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

    let Some(token) = token else {
        security_event!(
            SecurityEvent::AccessDenied,
            path = %request.uri().path(),
            reason = "missing_cookie",
            "Request without session cookie rejected"
        );
        return Err(AppError::unauthorized());
    };

    let subject = state
        .tokens
        .verify(&token, Purpose::Session)
        .map_err(|e| {
            security_event!(
                SecurityEvent::AccessDenied,
                path = %request.uri().path(),
                reason = %e.kind(),
                "Session token rejected"
            );
            AppError::unauthorized()
        })?;

    request.extensions_mut().insert(CurrentUser(subject));
    Ok(next.run(request).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or_else(AppError::unauthorized)
    }
}

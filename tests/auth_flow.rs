//! End-to-end flows through the assembled router with the in-memory store:
//! signup, login, session-gated profile access, partial update, logout, and
//! account deletion.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use chat_backend::auth::{Purpose, SESSION_COOKIE};
use chat_backend::avatar::MemoryAvatarStore;
use chat_backend::store::InMemoryStore;
use chat_backend::{build_router, AppConfig, AppState};

const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D];

fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        production: false,
        signing_seed: [7u8; 32],
        session_lifetime_secs: 3600,
        client_url: None,
        database_url: None,
        max_request_size: 10 * 1024 * 1024,
        avatar_dir: "avatars".to_string(),
        avatar_public_base: "/avatars".to_string(),
    }
}

fn test_app() -> (Router, AppState) {
    let state = AppState::new(
        test_config(),
        Arc::new(InMemoryStore::new()),
        Arc::new(MemoryAvatarStore::new()),
    );
    (build_router(state.clone()), state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// The `chat_app=<token>` pair from a Set-Cookie header
fn session_cookie_pair(response: &Response<Body>) -> Option<String> {
    let raw = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    let pair = raw.split(';').next()?.trim();
    pair.starts_with(&format!("{}=", SESSION_COOKIE))
        .then(|| pair.to_string())
}

async fn signup(app: &Router, username: &str, password: &str) -> Response<Body> {
    send(
        app,
        json_request(
            "POST",
            "/api/auth/signup",
            json!({"username": username, "password": password}),
        ),
    )
    .await
}

async fn login(app: &Router, username: &str, password: &str) -> Response<Body> {
    send(
        app,
        json_request(
            "POST",
            "/api/auth/login",
            json!({"username": username, "password": password}),
        ),
    )
    .await
}

/// Signup + login, returning the session cookie pair for later requests
async fn establish_session(app: &Router, username: &str, password: &str) -> String {
    let created = signup(app, username, password).await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let logged_in = login(app, username, password).await;
    assert_eq!(logged_in.status(), StatusCode::OK);
    session_cookie_pair(&logged_in).expect("login sets the session cookie")
}

fn multipart_request(uri: &str, fields: &[(&str, &[u8], bool)]) -> Request<Body> {
    const BOUNDARY: &str = "test-boundary-7f3a9c";

    let mut body: Vec<u8> = Vec::new();
    for (name, value, is_file) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        if *is_file {
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"upload\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name
                )
                .as_bytes(),
            );
        } else {
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            );
        }
        body.extend_from_slice(value);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

// ============================================================================
// Signup
// ============================================================================

#[tokio::test]
async fn signup_rejects_empty_fields() {
    let (app, _) = test_app();

    let response = signup(&app, "", "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["errors"]["username"].is_string());
    assert!(body["errors"]["password"].is_string());
}

#[tokio::test]
async fn signup_rejects_over_length_fields() {
    let (app, _) = test_app();

    let response = signup(&app, &"u".repeat(40), &"p".repeat(200)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["errors"]["username"].as_str().unwrap().contains("30"));
    assert!(body["errors"]["password"].as_str().unwrap().contains("100"));
}

#[tokio::test]
async fn signup_creates_account() {
    let (app, _) = test_app();

    let response = signup(&app, "test-user", "test-password").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    // Signup never establishes a session.
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn signup_duplicate_username() {
    let (app, state) = test_app();

    assert_eq!(
        signup(&app, "test-user", "test-password").await.status(),
        StatusCode::CREATED
    );

    let second = signup(&app, "test-user", "other-password").await;
    assert_eq!(second.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(second).await["message"],
        "User already exists."
    );

    // Exactly one account for that username survives.
    let account = state
        .store
        .find_by_username("test-user")
        .await
        .unwrap()
        .expect("account exists");
    assert_eq!(account.username, "test-user");
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn login_rejects_empty_fields() {
    let (app, _) = test_app();

    let response = login(&app, "", "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["errors"]["username"].is_string());
    assert!(body["errors"]["password"].is_string());
}

#[tokio::test]
async fn login_unknown_user() {
    let (app, _) = test_app();

    let response = login(&app, "unknown", "test-password").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["message"], "User not exists.");
}

#[tokio::test]
async fn login_wrong_password_issues_no_cookie() {
    let (app, _) = test_app();
    assert_eq!(
        signup(&app, "alice", "correct-horse").await.status(),
        StatusCode::CREATED
    );

    let response = login(&app, "alice", "wrong").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_json(response).await["message"], "Password not correct.");
}

#[tokio::test]
async fn login_issues_verifiable_session_token() {
    let (app, state) = test_app();

    let cookie = establish_session(&app, "alice", "correct-horse").await;
    let token = cookie
        .strip_prefix(&format!("{}=", SESSION_COOKIE))
        .expect("cookie pair");
    assert!(!token.is_empty());

    // The cookie value verifies to the stored account's identity.
    let subject = state.tokens.verify(token, Purpose::Session).unwrap();
    let account = state
        .store
        .find_by_username("alice")
        .await
        .unwrap()
        .expect("account exists");
    assert_eq!(subject, account.id);
}

#[tokio::test]
async fn repeated_failures_lock_the_username() {
    let (app, _) = test_app();
    assert_eq!(
        signup(&app, "alice", "correct-horse").await.status(),
        StatusCode::CREATED
    );

    // Default policy: fifth failure inside the window locks the name.
    for _ in 0..4 {
        let response = login(&app, "alice", "wrong").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    let fifth = login(&app, "alice", "wrong").await;
    assert_eq!(fifth.status(), StatusCode::TOO_MANY_REQUESTS);

    // Even the correct password is refused while locked.
    let while_locked = login(&app, "alice", "correct-horse").await;
    assert_eq!(while_locked.status(), StatusCode::TOO_MANY_REQUESTS);
}

// ============================================================================
// Session gate
// ============================================================================

#[tokio::test]
async fn protected_routes_reject_missing_cookie() {
    let (app, _) = test_app();

    for (method, uri) in [
        ("POST", "/api/auth/signout"),
        ("GET", "/api/user/profile"),
        ("PATCH", "/api/user/profile/update"),
        ("DELETE", "/api/user/profile/delete"),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn gate_rejections_are_uniform() {
    let (app, _) = test_app();

    // Garbage, a tampered token, and a foreign-purpose token must all look
    // identical to the client.
    let foreign = chat_backend::auth::TokenService::from_seed(&[9u8; 32]);
    let foreign_token = foreign
        .issue(uuid::Uuid::new_v4(), std::time::Duration::from_secs(60), Purpose::Session)
        .unwrap();

    for value in ["garbage", "a.b", foreign_token.as_str()] {
        let request = Request::builder()
            .method("GET")
            .uri("/api/user/profile")
            .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, value))
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "Unauthorized.");
    }
}

#[tokio::test]
async fn profile_returns_account_without_hash() {
    let (app, _) = test_app();
    let cookie = establish_session(&app, "alice", "correct-horse").await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/user/profile")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["username"], "alice");
    assert!(body["avatar"].is_string());
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn signout_clears_cookie_but_cannot_revoke_token() {
    let (app, _) = test_app();
    let cookie = establish_session(&app, "alice", "correct-horse").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/signout")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    // The client-held cookie is overwritten with an empty value.
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("signout sets a removal cookie");
    assert!(cleared.starts_with(&format!("{}=;", SESSION_COOKIE)));

    // Documented limitation of stateless invalidation: a replayed copy of
    // the old token is indistinguishable from a live session until expiry.
    let replay = Request::builder()
        .method("GET")
        .uri("/api/user/profile")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = send(&app, replay).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Profile update
// ============================================================================

#[tokio::test]
async fn update_single_field() {
    let (app, state) = test_app();
    let cookie = establish_session(&app, "test-user", "test-password").await;

    let mut request = multipart_request(
        "/api/user/profile/update",
        &[("username", b"test-user-updated".as_slice(), false)],
    );
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let account = state
        .store
        .find_by_username("test-user-updated")
        .await
        .unwrap();
    assert!(account.is_some());
    assert!(state
        .store
        .find_by_username("test-user")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn update_password_allows_login_with_new_credential() {
    let (app, _) = test_app();
    let cookie = establish_session(&app, "test-user", "test-password").await;

    let mut request = multipart_request(
        "/api/user/profile/update",
        &[
            ("username", b"test-user-updated".as_slice(), false),
            ("password", b"rotated-password".as_slice(), false),
        ],
    );
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);

    assert_eq!(
        login(&app, "test-user-updated", "rotated-password").await.status(),
        StatusCode::OK
    );
    assert_eq!(
        login(&app, "test-user-updated", "test-password").await.status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn update_avatar_accepts_png_by_content() {
    let (app, state) = test_app();
    let cookie = establish_session(&app, "alice", "correct-horse").await;

    let mut request = multipart_request(
        "/api/user/profile/update",
        &[("avatar", PNG_BYTES, true)],
    );
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);

    let account = state
        .store
        .find_by_username("alice")
        .await
        .unwrap()
        .expect("account exists");
    assert!(account.avatar.unwrap().ends_with("avatar.png"));
}

#[tokio::test]
async fn update_avatar_rejects_non_image_content() {
    let (app, _) = test_app();
    let cookie = establish_session(&app, "alice", "correct-horse").await;

    // A text file wearing an image name is still rejected: detection is by
    // content, not filename.
    let mut request = multipart_request(
        "/api/user/profile/update",
        &[("avatar", b"plain text pretending to be cute.png".as_slice(), true)],
    );
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(response).await["message"],
        "Only image file are allowed (jpeg/png)."
    );
}

// ============================================================================
// Account deletion
// ============================================================================

#[tokio::test]
async fn delete_removes_account_and_clears_cookie() {
    let (app, state) = test_app();
    let cookie = establish_session(&app, "test-user", "test-password").await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/user/profile/delete")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("delete clears the session cookie");
    assert!(cleared.starts_with(&format!("{}=;", SESSION_COOKIE)));

    assert!(state.store.find_by_username("test-user").await.unwrap().is_none());

    // The still-valid token now resolves to a missing account.
    let request = Request::builder()
        .method("GET")
        .uri("/api/user/profile")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::NOT_FOUND);

    // And logging in as the deleted user fails like any unknown user.
    let response = login(&app, "test-user", "test-password").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["message"], "User not exists.");
}

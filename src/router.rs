//! Application State & Router Assembly
//!
//! [`AppState`] wires the injected collaborators (store, avatar store,
//! token service, login tracker) together; [`build_router`] lays the routes
//! out in two groups, with the session gate on everything that requires an
//! authenticated identity, and applies the hardening layers outermost-last.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::warn;

use crate::auth::{self, require_session, AccountService, LoginTracker, TokenService};
use crate::avatar::AvatarStore;
use crate::config::AppConfig;
use crate::store::UserStore;
use crate::user;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn UserStore>,
    pub accounts: AccountService,
    pub tokens: Arc<TokenService>,
    pub avatars: Arc<dyn AvatarStore>,
    pub logins: Arc<LoginTracker>,
}

impl AppState {
    /// Assemble state from the injected collaborators.
    ///
    /// The signing keypair is constructed here, once, from the configured
    /// seed; nothing else ever touches the secret material.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn UserStore>,
        avatars: Arc<dyn AvatarStore>,
    ) -> Self {
        let tokens = Arc::new(TokenService::from_seed(&config.signing_seed));
        let accounts = AccountService::new(store.clone());

        Self {
            config: Arc::new(config),
            store,
            accounts,
            tokens,
            avatars,
            logins: Arc::new(LoginTracker::with_default_policy()),
        }
    }

    /// Session token lifetime from configuration
    pub fn session_lifetime(&self) -> Duration {
        Duration::from_secs(self.config.session_lifetime_secs)
    }
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(root))
        .route("/api/auth/signup", post(auth::handlers::signup))
        .route("/api/auth/login", post(auth::handlers::login));

    let protected = Router::new()
        .route("/api/auth/signout", post(auth::handlers::signout))
        .route("/api/user/profile", get(user::handlers::get_profile))
        .route("/api/user/profile/update", patch(user::handlers::update_profile))
        .route("/api/user/profile/delete", delete(user::handlers::delete_profile))
        .layer(middleware::from_fn_with_state(state.clone(), require_session));

    let mut router = Router::new()
        .merge(public)
        .merge(protected)
        .layer(DefaultBodyLimit::max(state.config.max_request_size))
        // Security headers on every response
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        ));

    // Credentialed CORS for the configured web client only
    if let Some(ref origin) = state.config.client_url {
        match origin.parse::<HeaderValue>() {
            Ok(origin) => {
                router = router.layer(
                    CorsLayer::new()
                        .allow_origin(origin)
                        .allow_credentials(true)
                        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
                        .allow_headers([header::CONTENT_TYPE]),
                );
            }
            Err(_) => warn!(client_url = %origin, "CLIENT_URL is not a valid origin; CORS disabled"),
        }
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// GET / - liveness greeting
async fn root() -> &'static str {
    "Hello World!"
}

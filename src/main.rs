//! Process entry point: logging, configuration, collaborator wiring, serve.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use chat_backend::avatar::FsAvatarStore;
use chat_backend::observability::SecurityEvent;
use chat_backend::security_event;
use chat_backend::store::UserStore;
use chat_backend::{build_router, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured JSON logging; RUST_LOG overrides the default filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,chat_backend=debug".into()),
        )
        .json()
        .init();

    // Missing or malformed secret material aborts startup here.
    let config = AppConfig::from_env().context("loading configuration")?;

    let store = select_store(&config).await?;
    let avatars = Arc::new(FsAvatarStore::new(
        config.avatar_dir.clone(),
        config.avatar_public_base.clone(),
    ));

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, store, avatars);
    let app = build_router(state);

    security_event!(SecurityEvent::SystemStartup, address = %bind_addr, "Starting server");
    info!(address = %bind_addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;
    axum::serve(listener, app).await.context("serving")?;

    Ok(())
}

#[cfg(feature = "postgres")]
async fn select_store(config: &AppConfig) -> anyhow::Result<Arc<dyn UserStore>> {
    use chat_backend::store::{InMemoryStore, PgStore};

    match config.database_url {
        Some(ref url) => {
            let store = PgStore::connect(url).await.context("connecting user store")?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn select_store(config: &AppConfig) -> anyhow::Result<Arc<dyn UserStore>> {
    use chat_backend::store::InMemoryStore;

    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL is set but the postgres feature is disabled; using the in-memory store");
    }
    Ok(Arc::new(InMemoryStore::new()))
}

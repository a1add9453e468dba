//! Server Initialization
//!
//! Builds the application: picks the message store (PostgreSQL when
//! `DATABASE_URL` is set, in-memory otherwise), wires up the registry,
//! router and tracker, loads the token directory, and configures the
//! routes. Also spawns the periodic sweep that retires registry entries
//! left behind by disconnected users.

use std::sync::Arc;

use axum::Router;

use crate::backend::auth::{Authenticator, TokenDirectory};
use crate::backend::registry::ConnectionRegistry;
use crate::backend::router::{MessageRouter, RouterConfig};
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, load_tokens, ServerConfig};
use crate::backend::server::state::AppState;
use crate::backend::store::{MemoryStore, MessageStore, PgMessageStore};
use crate::backend::tracker::DeliveryTracker;

/// How often empty registry slots are swept away.
const REGISTRY_SWEEP_INTERVAL_SECS: u64 = 300;

/// Create and configure the Axum application from the environment.
pub async fn create_app() -> Router {
    let config = ServerConfig::from_env();

    let store: Arc<dyn MessageStore> = match load_database().await {
        Some(pool) => Arc::new(PgMessageStore::new(pool)),
        None => Arc::new(MemoryStore::new()),
    };

    let tokens = load_tokens();
    if tokens.is_empty() {
        tracing::warn!("COURIER_TOKENS is empty, no client can authenticate");
    } else {
        tracing::info!(count = tokens.len(), "token directory loaded");
    }
    let authenticator: Arc<dyn Authenticator> = Arc::new(TokenDirectory::with_tokens(tokens));

    build_app(store, authenticator, config)
}

/// Assemble the application from explicit parts.
///
/// Split out of `create_app` so tests can inject an in-memory store and a
/// fixed token directory.
pub fn build_app(
    store: Arc<dyn MessageStore>,
    authenticator: Arc<dyn Authenticator>,
    config: ServerConfig,
) -> Router {
    let registry = Arc::new(ConnectionRegistry::new());
    let tracker = DeliveryTracker::new(store.clone(), registry.clone());
    let router = Arc::new(MessageRouter::new(
        store.clone(),
        registry.clone(),
        tracker.clone(),
        RouterConfig {
            max_content_chars: config.max_content_chars,
            dispatch_timeout: config.dispatch_timeout,
        },
    ));

    let state = AppState {
        router,
        tracker,
        registry: registry.clone(),
        store,
        authenticator,
        config,
    };

    // Disconnected users leave empty slots behind; sweep them periodically.
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(REGISTRY_SWEEP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            registry.sweep().await;
        }
    });

    create_router(state)
}

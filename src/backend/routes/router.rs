//! Router Configuration
//!
//! Assembles all HTTP routes into a single Axum router.
//!
//! # Routes
//!
//! - `POST /messages` - submit a message
//! - `GET /messages/pending` - undelivered backlog for the caller
//! - `POST /messages/{message_id}/delivered` - delivery acknowledgment
//! - `POST /messages/{message_id}/read` - read acknowledgment
//! - `GET /stream` - live event stream (SSE)
//! - `GET /presence/online` - identities with a live connection
//! - `GET /health` - liveness probe

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::backend::handlers::{
    health, mark_delivered, mark_read, online_identities, pending_messages, send_message,
    subscribe,
};
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/messages", post(send_message))
        .route("/messages/pending", get(pending_messages))
        .route("/messages/{message_id}/delivered", post(mark_delivered))
        .route("/messages/{message_id}/read", post(mark_read))
        .route("/stream", get(subscribe))
        .route("/presence/online", get(online_identities))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .fallback(|| async { "404 Not Found" })
        .with_state(app_state)
}

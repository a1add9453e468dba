//! Application State Management
//!
//! This module defines the application state structure and the `FromRef`
//! implementations for Axum state extraction.
//!
//! # Architecture
//!
//! `AppState` is the central state container, holding:
//! - the message router (validate, stamp, persist, dispatch)
//! - the delivery tracker (acknowledgment handling)
//! - the connection registry (identity-to-channel bindings)
//! - the message store behind its trait object
//! - the authenticator seam to the external identity service
//! - runtime configuration
//!
//! # Thread Safety
//!
//! Everything here is designed for concurrent access: the registry locks
//! per identity, the store synchronizes internally (connection pool or
//! mutex), and the rest is shared immutably behind `Arc`.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::auth::Authenticator;
use crate::backend::registry::ConnectionRegistry;
use crate::backend::router::MessageRouter;
use crate::backend::server::config::ServerConfig;
use crate::backend::store::MessageStore;
use crate::backend::tracker::DeliveryTracker;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Message router: validate, stamp, persist, dispatch
    pub router: Arc<MessageRouter>,

    /// Delivery/read acknowledgment tracking
    pub tracker: DeliveryTracker,

    /// Identity-to-channel bindings
    pub registry: Arc<ConnectionRegistry>,

    /// Durable message store
    pub store: Arc<dyn MessageStore>,

    /// Bearer-token resolution seam
    pub authenticator: Arc<dyn Authenticator>,

    /// Runtime configuration
    pub config: ServerConfig,
}

/// Allow handlers to extract the router directly from `AppState`.
impl FromRef<AppState> for Arc<MessageRouter> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.router.clone()
    }
}

/// Allow handlers to extract the tracker directly from `AppState`.
impl FromRef<AppState> for DeliveryTracker {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.tracker.clone()
    }
}

/// Allow handlers to extract the registry directly from `AppState`.
impl FromRef<AppState> for Arc<ConnectionRegistry> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

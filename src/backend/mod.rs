//! Backend Module
//!
//! Server-side code: the message router and its collaborators, plus the
//! Axum surface in front of them.
//!
//! # Architecture
//!
//! - **`registry`** - identity-to-channel bindings with per-identity locking
//! - **`store`** - the message persistence contract and its implementations
//! - **`router`** - validate, stamp, persist, dispatch
//! - **`tracker`** - delivery/read acknowledgment handling
//! - **`auth`** - the bearer-token seam to the external identity service
//! - **`handlers`** - HTTP handlers
//! - **`routes`** - route assembly
//! - **`server`** - configuration, shared state, initialization
//! - **`error`** - HTTP error mapping
//!
//! # Data Flow
//!
//! A client connects (`GET /stream`) and the registry records its
//! identity-to-channel binding. A sender submits (`POST /messages`); the
//! router stamps and persists the message, then resolves the recipient and
//! either dispatches it or leaves it pending for the recipient's next
//! connect. Acknowledgments (`/delivered`, `/read`) flow through the
//! tracker, which advances state forward-only and echoes receipts back to
//! the sender's connection.

/// Connection registry and channels
pub mod registry;

/// Message persistence
pub mod store;

/// Message routing core
pub mod router;

/// Delivery/read tracking
pub mod tracker;

/// Identity boundary
pub mod auth;

/// HTTP handlers
pub mod handlers;

/// Route configuration
pub mod routes;

/// Server setup and configuration
pub mod server;

/// API error types
pub mod error;

/// Re-export commonly used types
pub use error::ApiError;
pub use registry::{Channel, ConnectionRegistry};
pub use router::{MessageRouter, RouterConfig};
pub use server::{build_app, create_app, AppState, ServerConfig};
pub use store::{MemoryStore, MessageStore, PgMessageStore};
pub use tracker::DeliveryTracker;

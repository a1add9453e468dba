//! Shared Module
//!
//! Types that cross the wire between the server and its clients: the message
//! shape, the delivery lifecycle, the event frames pushed over a live
//! connection, and the error taxonomy.

/// Message data structures and delivery lifecycle
pub mod message;

/// Event frames pushed over live connections
pub mod event;

/// Routing and storage error types
pub mod error;

/// Re-export commonly used types for convenience
pub use error::{RoutingError, StoreError};
pub use event::ServerEvent;
pub use message::{DeliveryState, DirectMessage, SendMessageRequest};

//! HTTP Handlers
//!
//! - **`messages`** - submission, acknowledgments and backlog
//! - **`stream`** - the per-connection live event stream
//! - **`presence`** - online identities and the liveness probe

/// Message endpoints
pub mod messages;

/// Live event stream endpoint
pub mod stream;

/// Presence endpoints
pub mod presence;

pub use messages::{mark_delivered, mark_read, pending_messages, send_message};
pub use presence::{health, online_identities};
pub use stream::subscribe;

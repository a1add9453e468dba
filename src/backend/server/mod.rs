//! Server setup: configuration, shared state and initialization.

/// Environment-driven configuration
pub mod config;

/// Server initialization
pub mod init;

/// Application state
pub mod state;

pub use config::ServerConfig;
pub use init::{build_app, create_app};
pub use state::AppState;

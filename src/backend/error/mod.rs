//! API Error Module
//!
//! Error types returned from HTTP handlers and their conversions.
//!
//! - **`types`** - error definitions and status-code mapping
//! - **`conversion`** - `IntoResponse` implementation

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::ApiError;

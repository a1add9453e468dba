//! Routing Error Types
//!
//! This module defines the error taxonomy for message submission and
//! acknowledgment handling.
//!
//! # Error Categories
//!
//! - `Validation` - bad or missing fields, self-addressed or oversized
//!   messages; rejected before anything is persisted
//! - `Authorization` - identity spoofing or acknowledgments from a
//!   non-recipient; rejected and logged as security-relevant
//! - `Storage` - a failure from the durable store; retryable by the caller
//!   and never silently swallowed, since a lost append is a lost message
//!
//! Dispatch timeouts are deliberately absent: a slow or stalled recipient
//! degrades the message to `Pending` instead of failing the submission.

use thiserror::Error;

/// Failure from the durable message store
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// No message exists with the given id
    #[error("message {0} not found")]
    NotFound(i64),

    /// The storage backend failed; the operation may be retried
    #[error("storage backend error: {message}")]
    Backend {
        /// Human-readable error message
        message: String,
    },
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the router and the delivery tracker
#[derive(Debug, Error, Clone)]
pub enum RoutingError {
    /// Data validation error
    #[error("validation error in field '{field}': {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Caller is not allowed to perform the operation
    #[error("authorization error: {message}")]
    Authorization {
        /// Human-readable error message
        message: String,
    },

    /// Failure from the durable store
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl RoutingError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }
}

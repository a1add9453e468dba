//! API Error Types
//!
//! Maps the routing error taxonomy onto HTTP. Validation failures are the
//! client's fault, authorization failures are forbidden, storage failures
//! are retryable server errors, and an unknown message id is a plain 404.

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::error::{RoutingError, StoreError};

/// Errors returned from HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, malformed or unknown bearer token
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Human-readable error message
        message: String,
    },

    /// Error from the router or tracker
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// Server-side failure unrelated to the request
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable error message
        message: String,
    },
}

impl ApiError {
    /// Create a new unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Routing(err) => match err {
                RoutingError::Validation { .. } => StatusCode::BAD_REQUEST,
                RoutingError::Authorization { .. } => StatusCode::FORBIDDEN,
                RoutingError::Storage(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
                RoutingError::Storage(StoreError::Backend { .. }) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::Unauthorized { message } => message.clone(),
            Self::Internal { message } => message.clone(),
            Self::Routing(err) => err.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Routing(RoutingError::Storage(err))
    }
}

//! Identity Boundary
//!
//! The router never derives identity from a message payload: every request
//! carries a bearer token, and the token is resolved to an identity through
//! the `Authenticator` seam. Token issuance, credential storage and hashing
//! all live outside this service; the provided `TokenDirectory` is just the
//! lookup table that the external identity service provisions.

use std::collections::HashMap;
use std::sync::RwLock;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::backend::error::ApiError;
use crate::backend::server::state::AppState;

/// Resolves an opaque bearer token to an identity
pub trait Authenticator: Send + Sync {
    /// Returns the identity the token belongs to, or `None` when the token
    /// is unknown or revoked.
    fn authenticate(&self, token: &str) -> Option<String>;
}

/// In-memory token directory
///
/// Populated at startup (and updatable at runtime by whatever provisions
/// tokens); stands in for the external identity service's validation
/// endpoint.
#[derive(Debug, Default)]
pub struct TokenDirectory {
    tokens: RwLock<HashMap<String, String>>,
}

impl TokenDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from `token:identity` pairs.
    pub fn with_tokens<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let tokens = pairs
            .into_iter()
            .map(|(token, identity)| (token.into(), identity.into()))
            .collect();
        Self {
            tokens: RwLock::new(tokens),
        }
    }

    pub fn insert(&self, token: impl Into<String>, identity: impl Into<String>) {
        self.tokens
            .write()
            .expect("token directory lock poisoned")
            .insert(token.into(), identity.into());
    }

    pub fn revoke(&self, token: &str) {
        self.tokens
            .write()
            .expect("token directory lock poisoned")
            .remove(token);
    }
}

impl Authenticator for TokenDirectory {
    fn authenticate(&self, token: &str) -> Option<String> {
        self.tokens
            .read()
            .expect("token directory lock poisoned")
            .get(token)
            .cloned()
    }
}

/// Authenticated caller data attached to a request
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub identity: String,
}

/// Axum extractor for the authenticated caller
///
/// Pulls the bearer token out of the `Authorization` header and resolves it
/// through the app's authenticator. Handlers taking this parameter are
/// unreachable without a valid token.
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                tracing::warn!("missing Authorization header");
                ApiError::unauthorized("missing Authorization header")
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            tracing::warn!("invalid Authorization header format");
            ApiError::unauthorized("expected a bearer token")
        })?;

        let identity = state.authenticator.authenticate(token).ok_or_else(|| {
            tracing::warn!("rejected unknown bearer token");
            ApiError::unauthorized("invalid token")
        })?;

        Ok(AuthUser(AuthenticatedUser { identity }))
    }
}

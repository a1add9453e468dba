//! Presence Handlers
//!
//! Exposes which identities currently have a live connection, plus a plain
//! liveness probe.

use axum::{extract::State, Json};

use crate::backend::auth::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::message::OnlineIdentitiesResponse;

/// List identities with a live connection.
pub async fn online_identities(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Json<OnlineIdentitiesResponse> {
    let identities = state.registry.online_identities().await;
    Json(OnlineIdentitiesResponse { identities })
}

/// Liveness probe.
pub async fn health() -> &'static str {
    "OK"
}

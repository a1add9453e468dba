//! Message HTTP Handlers
//!
//! Submission, acknowledgment and backlog endpoints. All of them require a
//! bearer token; the authenticated identity is what the router and tracker
//! check requests against.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::backend::auth::AuthUser;
use crate::backend::error::ApiError;
use crate::backend::server::state::AppState;
use crate::shared::message::{
    DirectMessage, PendingMessagesResponse, ReceiptResponse, SendMessageRequest,
};

/// Submit a message.
///
/// The response is the stamped, persisted message: the server-assigned id,
/// the server timestamp and the state at acceptance. Delivery happens (or
/// doesn't) independently of this acknowledgment.
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<DirectMessage>, ApiError> {
    let message = state.router.submit(request, &user.identity).await?;
    Ok(Json(message))
}

/// Acknowledge that a message reached the caller's client.
///
/// Safe to retry; a confirmation for an already-delivered or already-read
/// message reports the stored state.
pub async fn mark_delivered(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(message_id): Path<i64>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    let delivery_state = state.tracker.mark_delivered(message_id).await?;
    Ok(Json(ReceiptResponse {
        message_id,
        delivery_state,
    }))
}

/// Mark a message as read by the caller.
///
/// Only the message's recipient may do this.
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(message_id): Path<i64>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    let delivery_state = state.tracker.mark_read(message_id, &user.identity).await?;
    Ok(Json(ReceiptResponse {
        message_id,
        delivery_state,
    }))
}

/// List the caller's undelivered backlog in commit order.
pub async fn pending_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<PendingMessagesResponse>, ApiError> {
    let messages = state
        .store
        .fetch_pending(&user.identity)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(PendingMessagesResponse { messages }))
}

//! Live Connection Handler
//!
//! `GET /stream` is the receiving side of the system: it authenticates the
//! caller, binds a fresh channel for them in the registry, replays their
//! pending backlog, and then streams live frames as server-sent events.
//!
//! The handler itself only sets up plumbing. A forwarder task drains the
//! bounded channel the router dispatches into and turns each frame into an
//! SSE `data:` line; a second task sends a keep-alive comment every 30
//! seconds so intermediaries keep the connection open. When the client goes
//! away (the body stream is dropped) the forwarder notices, tears itself
//! down and unbinds its own channel - and only its own, so a reconnect that
//! already replaced the binding is untouched.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
};
use bytes::Bytes;
use futures_util::stream;
use tokio::sync::mpsc;

use crate::backend::auth::AuthUser;
use crate::backend::error::ApiError;
use crate::backend::registry::Channel;
use crate::backend::server::state::AppState;
use crate::shared::event::ServerEvent;

const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Handle a subscription request.
pub async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Response<Body>, ApiError> {
    tracing::info!(identity = %user.identity, "subscription request received");

    let (channel, mut frames) = Channel::new(state.config.channel_capacity);
    let channel_id = channel.id();

    // Frames -> SSE bytes. Unbounded: the forwarder has to drain the
    // bounded frame queue even before the response body is being consumed,
    // or a large backlog replay would fill it and stall the connect.
    let (bytes_tx, bytes_rx) = mpsc::unbounded_channel::<Result<Bytes, std::io::Error>>();

    let registry = state.registry.clone();
    let identity = user.identity.clone();
    let forwarder_tx = bytes_tx.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                maybe_frame = frames.recv() => {
                    let Some(frame) = maybe_frame else { break };
                    let closing = matches!(frame, ServerEvent::Closed);
                    match serde_json::to_string(&frame) {
                        Ok(json) => {
                            let line = format!("data: {}\n\n", json);
                            if forwarder_tx.send(Ok(Bytes::from(line))).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::error!(identity = %identity, "failed to serialize frame: {:?}", e);
                        }
                    }
                    if closing {
                        break;
                    }
                }
                // Client dropped the response body.
                _ = forwarder_tx.closed() => break,
            }
        }
        registry.unbind_channel(&identity, channel_id).await;
        tracing::info!(identity = %identity, "subscription ended");
    });

    let heartbeat_tx = bytes_tx;
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
        loop {
            interval.tick().await;
            if heartbeat_tx
                .send(Ok(Bytes::from(": keep-alive\n\n")))
                .is_err()
            {
                break;
            }
        }
    });

    // Bind and replay under the identity's lock; live submissions wait
    // until the backlog is queued, so the client sees commit order.
    state.router.connect(&user.identity, channel).await?;

    let body_stream = stream::unfold(bytes_rx, |mut receiver| async move {
        receiver.recv().await.map(|item| (item, receiver))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache, no-transform, no-store")
        .header(header::CONNECTION, "keep-alive")
        // Stops nginx from buffering the stream.
        .header("X-Accel-Buffering", "no")
        .body(Body::from_stream(body_stream))
        .map_err(|e| {
            tracing::error!("failed to build subscription response: {:?}", e);
            ApiError::internal("failed to build response")
        })
}

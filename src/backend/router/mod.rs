//! Message Router
//!
//! The central state machine: accepts an inbound message, validates it,
//! stamps it with server-authoritative metadata, persists it, and only then
//! tries to push it to the recipient's live channel.
//!
//! # Persist-then-dispatch
//!
//! Acceptance is defined by the durable append, not by delivery. A message
//! that cannot be pushed right now (recipient offline, channel stalled past
//! the dispatch timeout, channel torn down mid-send) stays `Pending` and is
//! replayed on the recipient's next connect. Dispatch problems are therefore
//! never submission errors.
//!
//! # Ordering
//!
//! The recipient's registry lock is held from before the append until after
//! the dispatch attempt. Submissions to different recipients run in
//! parallel; submissions to one recipient commit and dispatch in the same
//! order, and a reconnect cannot interleave its backlog replay with a live
//! dispatch.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;

use crate::backend::registry::{Channel, ConnectionRegistry};
use crate::backend::store::MessageStore;
use crate::backend::tracker::DeliveryTracker;
use crate::shared::error::RoutingError;
use crate::shared::event::ServerEvent;
use crate::shared::message::{DeliveryState, DirectMessage, SendMessageRequest};

/// Tunables for submission handling
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Maximum accepted content length, in characters
    pub max_content_chars: usize,
    /// How long one dispatch may wait on a backpressured channel
    pub dispatch_timeout: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_content_chars: 4096,
            dispatch_timeout: Duration::from_secs(5),
        }
    }
}

/// Check a submission against the authenticated sender and the size bound.
///
/// Runs before anything is stamped or persisted; a violation leaves no
/// partial state behind.
pub fn validate_submission(
    request: &SendMessageRequest,
    sender_identity: &str,
    max_content_chars: usize,
) -> Result<(), RoutingError> {
    if request.sender_id != sender_identity {
        tracing::warn!(
            claimed = %request.sender_id,
            authenticated = %sender_identity,
            "submission rejected: sender_id does not match authenticated identity"
        );
        return Err(RoutingError::authorization(
            "sender_id does not match the authenticated identity",
        ));
    }
    if request.receiver_id.is_empty() {
        return Err(RoutingError::validation(
            "receiver_id",
            "receiver_id must not be empty",
        ));
    }
    if request.receiver_id == request.sender_id {
        return Err(RoutingError::validation(
            "receiver_id",
            "a message cannot target its own sender",
        ));
    }
    if request.content.is_empty() {
        return Err(RoutingError::validation(
            "content",
            "content must not be empty",
        ));
    }
    let chars = request.content.chars().count();
    if chars > max_content_chars {
        return Err(RoutingError::validation(
            "content",
            format!(
                "content is {} characters, limit is {}",
                chars, max_content_chars
            ),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchOutcome {
    Delivered,
    TimedOut,
    Closed,
}

/// Routes messages between identities
pub struct MessageRouter {
    store: Arc<dyn MessageStore>,
    registry: Arc<ConnectionRegistry>,
    tracker: DeliveryTracker,
    config: RouterConfig,
}

impl MessageRouter {
    pub fn new(
        store: Arc<dyn MessageStore>,
        registry: Arc<ConnectionRegistry>,
        tracker: DeliveryTracker,
        config: RouterConfig,
    ) -> Self {
        Self {
            store,
            registry,
            tracker,
            config,
        }
    }

    /// Accept a message from the authenticated sender.
    ///
    /// Returns the stamped, persisted message as the acknowledgment of
    /// acceptance. `delivery_state` in the return value is the state at
    /// acceptance (`Pending`); when the recipient is online the stored state
    /// advances to `Delivered` before this returns.
    ///
    /// Unknown receivers are indistinguishable from offline ones here: the
    /// message is persisted as `Pending` either way.
    pub async fn submit(
        &self,
        request: SendMessageRequest,
        sender_identity: &str,
    ) -> Result<DirectMessage, RoutingError> {
        validate_submission(&request, sender_identity, self.config.max_content_chars)?;

        // Serializes with every other submit to this recipient and with
        // connect/bind, which is what keeps dispatch in commit order.
        let mut binding = self.registry.lock(&request.receiver_id).await;

        let mut message = DirectMessage {
            message_id: 0,
            sender_id: request.sender_id,
            receiver_id: request.receiver_id,
            content: request.content,
            // Server-stamped; whatever the client put in `sent_at` is gone.
            sent_at: Utc::now(),
            delivery_state: DeliveryState::Pending,
        };
        message.message_id = self.store.append(&message).await?;
        tracing::debug!(
            message_id = message.message_id,
            sender = %message.sender_id,
            receiver = %message.receiver_id,
            "message accepted"
        );

        match binding.as_ref().cloned() {
            Some(channel) => {
                if self.dispatch(&message, &channel).await == DispatchOutcome::Closed {
                    binding.take();
                }
            }
            None => {
                tracing::debug!(
                    message_id = message.message_id,
                    receiver = %message.receiver_id,
                    "recipient offline, message left pending"
                );
            }
        }
        drop(binding);

        Ok(message)
    }

    /// Install a new connection for `identity` and replay its backlog.
    ///
    /// Holds the identity's binding lock for the whole replace-and-replay,
    /// so a live dispatch can neither land on the outgoing channel after its
    /// replacement nor duplicate a message the replay already pushed.
    pub async fn connect(&self, identity: &str, channel: Channel) -> Result<(), RoutingError> {
        let mut binding = self.registry.lock(identity).await;
        if let Some(old) = binding.take() {
            tracing::debug!(identity, "replacing existing connection");
            old.close();
        }
        *binding = Some(channel.clone());

        let backlog = self.store.fetch_pending(identity).await?;
        if backlog.is_empty() {
            return Ok(());
        }
        tracing::info!(identity, count = backlog.len(), "replaying pending backlog");
        for message in &backlog {
            match timeout(
                self.config.dispatch_timeout,
                channel.send(ServerEvent::message(message.clone())),
            )
            .await
            {
                Ok(Ok(())) => {
                    self.note_delivered(message.message_id).await;
                }
                Ok(Err(_closed)) => {
                    tracing::debug!(identity, "connection closed during backlog replay");
                    binding.take();
                    break;
                }
                Err(_elapsed) => {
                    // Slow client; the rest of the backlog stays pending.
                    tracing::debug!(identity, "backlog replay timed out");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Push one freshly persisted message to a resolved channel.
    ///
    /// Failure here never propagates: a timeout leaves the binding in place
    /// and the message pending, a closed channel tells the caller to drop
    /// the binding.
    async fn dispatch(&self, message: &DirectMessage, channel: &Channel) -> DispatchOutcome {
        match timeout(
            self.config.dispatch_timeout,
            channel.send(ServerEvent::message(message.clone())),
        )
        .await
        {
            Ok(Ok(())) => {
                self.note_delivered(message.message_id).await;
                DispatchOutcome::Delivered
            }
            Ok(Err(_closed)) => {
                tracing::debug!(
                    message_id = message.message_id,
                    receiver = %message.receiver_id,
                    "recipient channel closed mid-dispatch, message left pending"
                );
                DispatchOutcome::Closed
            }
            Err(_elapsed) => {
                tracing::debug!(
                    message_id = message.message_id,
                    receiver = %message.receiver_id,
                    "dispatch timed out, message left pending"
                );
                DispatchOutcome::TimedOut
            }
        }
    }

    /// Record a successful push.
    ///
    /// The message is already durably accepted, so a failure to record
    /// `Delivered` is logged and absorbed; the recipient's own acknowledgment
    /// can advance the state later.
    async fn note_delivered(&self, message_id: i64) {
        if let Err(e) = self.tracker.mark_delivered(message_id).await {
            tracing::warn!(message_id, error = %e, "failed to record delivery");
        }
    }
}

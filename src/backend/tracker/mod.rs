//! Delivery/Read Tracker
//!
//! Advances a message's delivery state in response to dispatch outcomes and
//! client acknowledgments, and echoes the change back to the sender's live
//! connection when there is one.
//!
//! Both operations are total with respect to state: an acknowledgment for a
//! message that has already moved past the proposed state is a no-op that
//! reports the stored state, so retried client acknowledgments are always
//! safe.

use std::sync::Arc;

use crate::backend::registry::ConnectionRegistry;
use crate::backend::store::MessageStore;
use crate::shared::error::{RoutingError, StoreError};
use crate::shared::event::ServerEvent;
use crate::shared::message::DeliveryState;

/// Tracks and advances message delivery state
#[derive(Clone)]
pub struct DeliveryTracker {
    store: Arc<dyn MessageStore>,
    registry: Arc<ConnectionRegistry>,
}

impl DeliveryTracker {
    pub fn new(store: Arc<dyn MessageStore>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    /// Record that a message reached its recipient's channel.
    ///
    /// Advances `Pending -> Delivered`; any other starting state is left
    /// untouched and reported back, so repeated confirmations never error.
    pub async fn mark_delivered(&self, message_id: i64) -> Result<DeliveryState, RoutingError> {
        let message = self
            .store
            .fetch(message_id)
            .await?
            .ok_or(StoreError::NotFound(message_id))?;

        let state = self
            .store
            .advance_state(message_id, DeliveryState::Delivered)
            .await?;

        if message.delivery_state != state {
            tracing::debug!(message_id, state = state.as_str(), "message delivered");
            self.echo_to_sender(&message.sender_id, message_id, state);
        }
        Ok(state)
    }

    /// Record that the recipient read a message.
    ///
    /// Only the message's receiver may do this; anyone else gets an
    /// authorization error and the state is left unchanged. Valid from
    /// `Pending` or `Delivered`, idempotent from `Read`.
    pub async fn mark_read(
        &self,
        message_id: i64,
        reader_identity: &str,
    ) -> Result<DeliveryState, RoutingError> {
        let message = self
            .store
            .fetch(message_id)
            .await?
            .ok_or(StoreError::NotFound(message_id))?;

        if message.receiver_id != reader_identity {
            tracing::warn!(
                message_id,
                reader = reader_identity,
                "read receipt rejected: caller is not the recipient"
            );
            return Err(RoutingError::authorization(
                "only the recipient may mark a message read",
            ));
        }

        let state = self
            .store
            .advance_state(message_id, DeliveryState::Read)
            .await?;

        if message.delivery_state != state {
            tracing::debug!(message_id, state = state.as_str(), "message read");
            self.echo_to_sender(&message.sender_id, message_id, state);
        }
        Ok(state)
    }

    /// Best-effort receipt echo to the sender's channel.
    ///
    /// Never waits: the caller may already hold another identity's binding
    /// lock, and a full or closed sender channel just drops the echo.
    fn echo_to_sender(&self, sender_id: &str, message_id: i64, state: DeliveryState) {
        if let Some(channel) = self.registry.try_resolve(sender_id) {
            let _ = channel.try_send(ServerEvent::receipt(message_id, state));
        }
    }
}

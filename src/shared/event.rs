//! Server Event Frames
//!
//! Frames pushed over a connected client's channel. A frame is either a
//! full message, a delivery-state receipt echoed back to the sender, or the
//! close notice a connection receives when a newer connection replaces it.

use serde::{Deserialize, Serialize};

use crate::shared::message::{DeliveryState, DirectMessage};

/// A single frame pushed to a subscribed client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A message routed to this client
    Message { message: DirectMessage },
    /// Delivery-state change for a message this client sent
    Receipt {
        message_id: i64,
        delivery_state: DeliveryState,
    },
    /// The binding behind this connection was replaced by a newer connect
    Closed,
}

impl ServerEvent {
    pub fn message(message: DirectMessage) -> Self {
        ServerEvent::Message { message }
    }

    pub fn receipt(message_id: i64, delivery_state: DeliveryState) -> Self {
        ServerEvent::Receipt {
            message_id,
            delivery_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_serializes_with_tag() {
        let event = ServerEvent::receipt(7, DeliveryState::Read);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"receipt\""));
        assert!(json.contains("\"delivery_state\":\"read\""));
    }

    #[test]
    fn test_event_round_trip() {
        let event = ServerEvent::Closed;
        let json = serde_json::to_string(&event).unwrap();
        let back: ServerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}

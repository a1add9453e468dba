//! Direct Message Data Structures
//!
//! Represents a point-to-point message between two users and its delivery
//! lifecycle. The server owns `message_id`, `sent_at` and `delivery_state`;
//! clients supply only the addressing fields and the content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle stage of a message.
///
/// Transitions are forward-only: `Pending -> Delivered -> Read`. The variant
/// order drives the derived `Ord`, which is what the store uses to clamp
/// state changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    /// Accepted and persisted, not yet pushed to the recipient
    Pending,
    /// Pushed to a live recipient channel
    Delivered,
    /// Acknowledged as read by the recipient
    Read,
}

impl Default for DeliveryState {
    fn default() -> Self {
        DeliveryState::Pending
    }
}

impl DeliveryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryState::Pending => "pending",
            DeliveryState::Delivered => "delivered",
            DeliveryState::Read => "read",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(DeliveryState::Pending),
            "delivered" => Some(DeliveryState::Delivered),
            "read" => Some(DeliveryState::Read),
            _ => None,
        }
    }

    /// Apply a proposed transition without ever moving backward.
    ///
    /// Returns the later of the two states, so repeated or out-of-order
    /// acknowledgments collapse into no-ops.
    pub fn advanced_to(self, proposed: DeliveryState) -> DeliveryState {
        if proposed > self {
            proposed
        } else {
            self
        }
    }
}

/// Represents a direct message between two users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectMessage {
    /// Server-assigned id, strictly increasing within the store
    pub message_id: i64,
    /// Identity of the sender
    pub sender_id: String,
    /// Identity of the recipient
    pub receiver_id: String,
    /// Text payload
    pub content: String,
    /// Server-stamped ingestion time
    pub sent_at: DateTime<Utc>,
    /// Current delivery lifecycle stage
    #[serde(default)]
    pub delivery_state: DeliveryState,
}

/// Request to send a message
///
/// `sender_id` must match the authenticated caller. A `sent_at` value, if a
/// client supplies one, is discarded and replaced with server time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

/// Response for a delivery or read acknowledgment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReceiptResponse {
    pub message_id: i64,
    pub delivery_state: DeliveryState,
}

/// Response for listing a user's undelivered backlog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingMessagesResponse {
    pub messages: Vec<DirectMessage>,
}

/// Response for the online-identity presence query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineIdentitiesResponse {
    pub identities: Vec<String>,
}

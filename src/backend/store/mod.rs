//! Message Store Adapter
//!
//! Narrow persistence contract for messages and their delivery state. The
//! router and tracker only depend on this trait; the actual storage engine
//! lives behind it (PostgreSQL in production, in-memory when no database is
//! configured and in tests).

use async_trait::async_trait;

use crate::shared::error::StoreError;
use crate::shared::message::{DeliveryState, DirectMessage};

/// Port for message persistence.
///
/// Implementations must ensure:
/// - `append` is durable before it returns and assigns ids that are unique
///   and strictly increasing in commit order
/// - `advance_state` only ever moves the state forward (`Pending <
///   Delivered < Read`) and reports the state actually stored, so redundant
///   acknowledgments are safe to replay
/// - `fetch_pending` returns messages in ascending `sent_at` order with
///   ascending `message_id` as the tie-break
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message and return its server-assigned id.
    ///
    /// The `message_id` field of the input is ignored.
    async fn append(&self, message: &DirectMessage) -> Result<i64, StoreError>;

    /// Advance a message's delivery state, clamped forward-only.
    ///
    /// Returns the resulting state, which is the current one when the
    /// proposed transition would move backward.
    async fn advance_state(
        &self,
        message_id: i64,
        state: DeliveryState,
    ) -> Result<DeliveryState, StoreError>;

    /// Fetch a single message by id.
    async fn fetch(&self, message_id: i64) -> Result<Option<DirectMessage>, StoreError>;

    /// Fetch a recipient's undelivered backlog in commit order.
    async fn fetch_pending(&self, receiver_id: &str) -> Result<Vec<DirectMessage>, StoreError>;
}

/// In-memory store
pub mod memory;

/// PostgreSQL store
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgMessageStore;

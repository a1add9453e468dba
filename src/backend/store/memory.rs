//! In-memory message store
//!
//! Used when no `DATABASE_URL` is configured and by tests. Keeps the same
//! contract as the PostgreSQL store: durable-within-process appends with
//! monotonically increasing ids and forward-only state transitions.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::shared::error::StoreError;
use crate::shared::message::{DeliveryState, DirectMessage};

use super::MessageStore;

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: i64,
    rows: BTreeMap<i64, DirectMessage>,
}

/// Mutex-guarded map keyed by message id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append(&self, message: &DirectMessage) -> Result<i64, StoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::backend("store mutex poisoned"))?;
        inner.next_id += 1;
        let id = inner.next_id;
        let mut row = message.clone();
        row.message_id = id;
        inner.rows.insert(id, row);
        Ok(id)
    }

    async fn advance_state(
        &self,
        message_id: i64,
        state: DeliveryState,
    ) -> Result<DeliveryState, StoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::backend("store mutex poisoned"))?;
        let row = inner
            .rows
            .get_mut(&message_id)
            .ok_or(StoreError::NotFound(message_id))?;
        row.delivery_state = row.delivery_state.advanced_to(state);
        Ok(row.delivery_state)
    }

    async fn fetch(&self, message_id: i64) -> Result<Option<DirectMessage>, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::backend("store mutex poisoned"))?;
        Ok(inner.rows.get(&message_id).cloned())
    }

    async fn fetch_pending(&self, receiver_id: &str) -> Result<Vec<DirectMessage>, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::backend("store mutex poisoned"))?;
        let mut pending: Vec<DirectMessage> = inner
            .rows
            .values()
            .filter(|m| m.receiver_id == receiver_id && m.delivery_state == DeliveryState::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| {
            a.sent_at
                .cmp(&b.sent_at)
                .then(a.message_id.cmp(&b.message_id))
        });
        Ok(pending)
    }
}

//! PostgreSQL message store
//!
//! This module contains the database operations behind the message store
//! contract. Ids come from the `direct_messages` BIGSERIAL primary key, so
//! commit order and id order agree.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::shared::error::StoreError;
use crate::shared::message::{DeliveryState, DirectMessage};

use super::MessageStore;

/// Message store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::backend(err.to_string())
    }
}

fn row_to_message(row: &sqlx::postgres::PgRow) -> DirectMessage {
    let state: String = row.get("delivery_state");
    let sent_at: DateTime<Utc> = row.get("sent_at");
    DirectMessage {
        message_id: row.get("message_id"),
        sender_id: row.get("sender_id"),
        receiver_id: row.get("receiver_id"),
        content: row.get("content"),
        sent_at,
        delivery_state: DeliveryState::from_str(&state).unwrap_or_default(),
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn append(&self, message: &DirectMessage) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO direct_messages (sender_id, receiver_id, content, sent_at, delivery_state)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING message_id
            "#,
        )
        .bind(&message.sender_id)
        .bind(&message.receiver_id)
        .bind(&message.content)
        .bind(message.sent_at)
        .bind(message.delivery_state.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("message_id"))
    }

    async fn advance_state(
        &self,
        message_id: i64,
        state: DeliveryState,
    ) -> Result<DeliveryState, StoreError> {
        // Single statement so concurrent acknowledgments cannot interleave a
        // backward transition between a read and a write.
        let updated = sqlx::query(
            r#"
            UPDATE direct_messages
            SET delivery_state = $2
            WHERE message_id = $1
              AND CASE delivery_state
                    WHEN 'pending' THEN 0
                    WHEN 'delivered' THEN 1
                    ELSE 2
                  END
                < CASE $2::text
                    WHEN 'pending' THEN 0
                    WHEN 'delivered' THEN 1
                    ELSE 2
                  END
            RETURNING delivery_state
            "#,
        )
        .bind(message_id)
        .bind(state.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            let stored: String = row.get("delivery_state");
            return Ok(DeliveryState::from_str(&stored).unwrap_or(state));
        }

        // No row changed: either the id is unknown or the state was already
        // at or past the proposed one. Report whichever it is.
        let current = sqlx::query(
            r#"
            SELECT delivery_state FROM direct_messages WHERE message_id = $1
            "#,
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(message_id))?;

        let stored: String = current.get("delivery_state");
        Ok(DeliveryState::from_str(&stored).unwrap_or_default())
    }

    async fn fetch(&self, message_id: i64) -> Result<Option<DirectMessage>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT message_id, sender_id, receiver_id, content, sent_at, delivery_state
            FROM direct_messages
            WHERE message_id = $1
            "#,
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_message))
    }

    async fn fetch_pending(&self, receiver_id: &str) -> Result<Vec<DirectMessage>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT message_id, sender_id, receiver_id, content, sent_at, delivery_state
            FROM direct_messages
            WHERE receiver_id = $1 AND delivery_state = 'pending'
            ORDER BY sent_at ASC, message_id ASC
            "#,
        )
        .bind(receiver_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_message).collect())
    }
}

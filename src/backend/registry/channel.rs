//! Per-connection outbound channel
//!
//! Wraps the sending half of a bounded mpsc queue whose receiving half is
//! drained by the connection's stream handler. The id distinguishes
//! successive connections of the same identity, so a stale disconnect
//! callback can never tear down a newer binding.

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::shared::event::ServerEvent;

/// Error returned when sending on a channel whose receiver is gone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelClosed;

/// Handle for pushing frames to one connected client
#[derive(Debug, Clone)]
pub struct Channel {
    id: Uuid,
    tx: mpsc::Sender<ServerEvent>,
}

impl Channel {
    /// Create a channel with the given send-queue capacity.
    ///
    /// Returns the handle plus the receiver the transport side drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                id: Uuid::new_v4(),
                tx,
            },
            rx,
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Push a frame, waiting for queue space if the client is slow.
    pub async fn send(&self, event: ServerEvent) -> Result<(), ChannelClosed> {
        self.tx.send(event).await.map_err(|_| ChannelClosed)
    }

    /// Push a frame only if there is room right now.
    pub fn try_send(&self, event: ServerEvent) -> Result<(), ChannelClosed> {
        self.tx.try_send(event).map_err(|_| ChannelClosed)
    }

    /// Notify the connection that its binding was replaced.
    ///
    /// Best-effort and non-blocking; the stream also terminates on its own
    /// once every sender handle is dropped.
    pub fn close(&self) {
        let _ = self.tx.try_send(ServerEvent::Closed);
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_receive() {
        let (channel, mut rx) = Channel::new(4);
        channel.send(ServerEvent::Closed).await.unwrap();
        assert_eq!(rx.recv().await, Some(ServerEvent::Closed));
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let (channel, rx) = Channel::new(4);
        drop(rx);
        assert_eq!(channel.send(ServerEvent::Closed).await, Err(ChannelClosed));
        assert!(channel.is_closed());
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let (a, _rx_a) = Channel::new(1);
        let (b, _rx_b) = Channel::new(1);
        assert_ne!(a.id(), b.id());
    }
}

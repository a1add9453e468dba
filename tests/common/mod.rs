//! Common test utilities
//!
//! Builds a fully wired router core on the in-memory store, plus small
//! helpers for constructing requests and draining channels.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use courier::backend::{
    ConnectionRegistry, DeliveryTracker, MemoryStore, MessageRouter, MessageStore, RouterConfig,
};
use courier::shared::event::ServerEvent;
use courier::shared::message::{DirectMessage, SendMessageRequest};
use tokio::sync::mpsc;

/// A router core wired onto an in-memory store.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub registry: Arc<ConnectionRegistry>,
    pub tracker: DeliveryTracker,
    pub router: Arc<MessageRouter>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    pub fn with_config(config: RouterConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let tracker = DeliveryTracker::new(
            store.clone() as Arc<dyn MessageStore>,
            registry.clone(),
        );
        let router = Arc::new(MessageRouter::new(
            store.clone() as Arc<dyn MessageStore>,
            registry.clone(),
            tracker.clone(),
            config,
        ));
        Self {
            store,
            registry,
            tracker,
            router,
        }
    }

    /// A context with a short dispatch timeout, for timeout-path tests.
    pub fn with_short_timeout() -> Self {
        Self::with_config(RouterConfig {
            max_content_chars: 4096,
            dispatch_timeout: Duration::from_millis(50),
        })
    }
}

pub fn request(sender: &str, receiver: &str, content: &str) -> SendMessageRequest {
    SendMessageRequest {
        sender_id: sender.to_string(),
        receiver_id: receiver.to_string(),
        content: content.to_string(),
        sent_at: None,
    }
}

/// Pull every frame currently queued on a receiver.
pub fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}

/// Extract the messages from a sequence of frames, ignoring receipts.
pub fn messages_of(frames: &[ServerEvent]) -> Vec<DirectMessage> {
    frames
        .iter()
        .filter_map(|frame| match frame {
            ServerEvent::Message { message } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

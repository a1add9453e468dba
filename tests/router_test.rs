//! Router integration tests
//!
//! Exercises the submission state machine end to end on the in-memory
//! store: persist-then-dispatch, offline queueing, backlog replay, ordering
//! and the dispatch failure paths.

mod common;

use common::{drain, messages_of, request, TestContext};
use courier::backend::Channel;
use courier::backend::MessageStore;
use courier::shared::error::RoutingError;
use courier::shared::event::ServerEvent;
use courier::shared::message::DeliveryState;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_submit_returns_monotonic_ids() {
    let ctx = TestContext::new();
    let mut last = 0;
    for n in 0..5 {
        let message = ctx
            .router
            .submit(request("alice", "bob", &format!("msg {}", n)), "alice")
            .await
            .unwrap();
        assert!(message.message_id > last);
        last = message.message_id;
    }
}

#[tokio::test]
async fn test_offline_recipient_leaves_message_pending() {
    let ctx = TestContext::new();
    let message = ctx
        .router
        .submit(request("alice", "bob", "hi"), "alice")
        .await
        .unwrap();

    assert_eq!(message.delivery_state, DeliveryState::Pending);

    let pending = ctx.store.fetch_pending("bob").await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].message_id, message.message_id);
}

#[tokio::test]
async fn test_online_recipient_gets_message_before_submit_returns() {
    let ctx = TestContext::new();
    let (channel, mut rx) = Channel::new(8);
    ctx.router.connect("bob", channel).await.unwrap();

    let message = ctx
        .router
        .submit(request("alice", "bob", "hi"), "alice")
        .await
        .unwrap();

    // The acceptance acknowledgment reports the state at acceptance.
    assert_eq!(message.delivery_state, DeliveryState::Pending);

    // Dispatch happened before submit returned.
    let frames = drain(&mut rx);
    let received = messages_of(&frames);
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].message_id, message.message_id);
    assert_eq!(received[0].content, "hi");

    // The stored state advanced to Delivered.
    let stored = ctx.store.fetch(message.message_id).await.unwrap().unwrap();
    assert_eq!(stored.delivery_state, DeliveryState::Delivered);
}

#[tokio::test]
async fn test_client_timestamp_is_overwritten() {
    let ctx = TestContext::new();
    let mut spoofed = request("alice", "bob", "hi");
    spoofed.sent_at = Some("2000-01-01T00:00:00Z".parse().unwrap());

    let before = chrono::Utc::now();
    let message = ctx.router.submit(spoofed, "alice").await.unwrap();
    let after = chrono::Utc::now();

    assert!(message.sent_at >= before && message.sent_at <= after);
}

#[tokio::test]
async fn test_spoofed_sender_is_rejected_before_persistence() {
    let ctx = TestContext::new();
    let result = ctx
        .router
        .submit(request("mallory", "bob", "hi"), "alice")
        .await;

    assert!(matches!(result, Err(RoutingError::Authorization { .. })));
    assert!(ctx.store.fetch_pending("bob").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_failure_persists_nothing() {
    let ctx = TestContext::new();
    let result = ctx
        .router
        .submit(request("alice", "alice", "hi"), "alice")
        .await;

    assert!(matches!(result, Err(RoutingError::Validation { .. })));
    assert!(ctx.store.fetch_pending("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_same_recipient_dispatch_follows_commit_order() {
    let ctx = TestContext::new();
    let (channel, mut rx) = Channel::new(64);
    ctx.router.connect("bob", channel).await.unwrap();

    // Many senders race to the same recipient.
    let mut handles = Vec::new();
    for n in 0..16 {
        let router = ctx.router.clone();
        let sender = format!("sender-{}", n);
        handles.push(tokio::spawn(async move {
            router
                .submit(request(&sender, "bob", "race"), &sender)
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let received = messages_of(&drain(&mut rx));
    assert_eq!(received.len(), 16);
    let ids: Vec<i64> = received.iter().map(|m| m.message_id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted, "dispatch order must match commit order");
}

#[tokio::test]
async fn test_backpressured_channel_times_out_to_pending() {
    let ctx = TestContext::with_short_timeout();
    // Capacity 1 and nobody draining: the second dispatch must block.
    let (channel, _rx) = Channel::new(1);
    ctx.router.connect("bob", channel).await.unwrap();

    let first = ctx
        .router
        .submit(request("alice", "bob", "fills the queue"), "alice")
        .await
        .unwrap();
    let second = ctx
        .router
        .submit(request("alice", "bob", "times out"), "alice")
        .await
        .unwrap();

    let first_stored = ctx.store.fetch(first.message_id).await.unwrap().unwrap();
    let second_stored = ctx.store.fetch(second.message_id).await.unwrap().unwrap();
    assert_eq!(first_stored.delivery_state, DeliveryState::Delivered);
    assert_eq!(second_stored.delivery_state, DeliveryState::Pending);

    // A slow client is not a dead client; the binding survives.
    assert!(ctx.registry.is_online("bob").await);
}

#[tokio::test]
async fn test_closed_channel_unbinds_and_leaves_pending() {
    let ctx = TestContext::new();
    let (channel, rx) = Channel::new(4);
    ctx.router.connect("bob", channel).await.unwrap();
    drop(rx);

    let message = ctx
        .router
        .submit(request("alice", "bob", "hi"), "alice")
        .await
        .unwrap();

    let stored = ctx.store.fetch(message.message_id).await.unwrap().unwrap();
    assert_eq!(stored.delivery_state, DeliveryState::Pending);
    assert!(!ctx.registry.is_online("bob").await);
}

#[tokio::test]
async fn test_connect_replays_backlog_in_commit_order() {
    let ctx = TestContext::new();
    let first = ctx
        .router
        .submit(request("alice", "bob", "first"), "alice")
        .await
        .unwrap();
    let second = ctx
        .router
        .submit(request("carol", "bob", "second"), "carol")
        .await
        .unwrap();

    let (channel, mut rx) = Channel::new(8);
    ctx.router.connect("bob", channel).await.unwrap();

    let replayed = messages_of(&drain(&mut rx));
    let ids: Vec<i64> = replayed.iter().map(|m| m.message_id).collect();
    assert_eq!(ids, vec![first.message_id, second.message_id]);

    for id in ids {
        let stored = ctx.store.fetch(id).await.unwrap().unwrap();
        assert_eq!(stored.delivery_state, DeliveryState::Delivered);
    }
    assert!(ctx.store.fetch_pending("bob").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reconnect_does_not_duplicate_delivery() {
    let ctx = TestContext::new();
    let (old, mut old_rx) = Channel::new(8);
    ctx.router.connect("bob", old).await.unwrap();

    let delivered = ctx
        .router
        .submit(request("alice", "bob", "already delivered"), "alice")
        .await
        .unwrap();

    let (new, mut new_rx) = Channel::new(8);
    ctx.router.connect("bob", new).await.unwrap();

    // The old connection got the message and then the close notice.
    let old_frames = drain(&mut old_rx);
    assert_eq!(messages_of(&old_frames).len(), 1);
    assert!(old_frames.contains(&ServerEvent::Closed));

    // The new connection must not see the already-delivered message again.
    assert!(messages_of(&drain(&mut new_rx)).is_empty());

    let stored = ctx.store.fetch(delivered.message_id).await.unwrap().unwrap();
    assert_eq!(stored.delivery_state, DeliveryState::Delivered);
}

#[tokio::test]
async fn test_sender_receives_read_receipt_echo() {
    let ctx = TestContext::new();
    let (alice_channel, mut alice_rx) = Channel::new(8);
    ctx.router.connect("alice", alice_channel).await.unwrap();

    let message = ctx
        .router
        .submit(request("alice", "bob", "hi"), "alice")
        .await
        .unwrap();

    ctx.tracker
        .mark_read(message.message_id, "bob")
        .await
        .unwrap();

    let frames = drain(&mut alice_rx);
    assert!(frames.contains(&ServerEvent::receipt(
        message.message_id,
        DeliveryState::Read
    )));
}

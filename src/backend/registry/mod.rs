//! Connection Registry
//!
//! Tracks which identities currently have a live outbound channel and how to
//! reach them. Each identity owns its own async lock, so bind, unbind and
//! resolve for unrelated users never contend on a common lock. The same
//! per-identity lock is what the router holds across persist-and-dispatch to
//! keep one recipient's messages in commit order.
//!
//! The registry is the exclusive owner of bindings: a new connection
//! replaces (and closes) the previous one for that identity, and disconnect
//! callbacks remove a binding only while it still refers to their own
//! channel.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-connection channel
pub mod channel;

pub use channel::{Channel, ChannelClosed};

type Slot = Arc<Mutex<Option<Channel>>>;

/// Identity-to-channel map with per-identity locking
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    slots: RwLock<HashMap<String, Slot>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn existing_slot(&self, identity: &str) -> Option<Slot> {
        self.slots
            .read()
            .expect("registry map lock poisoned")
            .get(identity)
            .cloned()
    }

    fn slot(&self, identity: &str) -> Slot {
        if let Some(slot) = self.existing_slot(identity) {
            return slot;
        }
        let mut map = self.slots.write().expect("registry map lock poisoned");
        map.entry(identity.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// Acquire the identity's binding lock, creating the slot if needed.
    ///
    /// The returned guard is what serializes everything that touches this
    /// identity's binding. The loop re-checks that the locked slot is still
    /// the registered one, since the sweep may retire an empty slot between
    /// lookup and lock.
    pub async fn lock(&self, identity: &str) -> OwnedMutexGuard<Option<Channel>> {
        loop {
            let slot = self.slot(identity);
            let guard = slot.clone().lock_owned().await;
            let still_registered = self
                .slots
                .read()
                .expect("registry map lock poisoned")
                .get(identity)
                .map(|current| Arc::ptr_eq(current, &slot))
                .unwrap_or(false);
            if still_registered {
                return guard;
            }
        }
    }

    /// Register `channel` as the live destination for `identity`.
    ///
    /// Last-connect-wins: a prior binding is closed (non-blocking) and
    /// replaced.
    pub async fn bind(&self, identity: &str, channel: Channel) {
        let mut binding = self.lock(identity).await;
        if let Some(old) = binding.take() {
            tracing::debug!(identity, "replacing existing binding");
            old.close();
        }
        *binding = Some(channel);
    }

    /// Remove the binding for `identity` if present; no-op when absent.
    pub async fn unbind(&self, identity: &str) {
        let Some(slot) = self.existing_slot(identity) else {
            return;
        };
        slot.lock().await.take();
    }

    /// Disconnect-callback variant of `unbind`: removes the binding only if
    /// it still refers to `channel_id`, so a callback from an old connection
    /// cannot tear down a newer one.
    pub async fn unbind_channel(&self, identity: &str, channel_id: Uuid) {
        let Some(slot) = self.existing_slot(identity) else {
            return;
        };
        let mut binding = slot.lock().await;
        if binding.as_ref().map(|c| c.id()) == Some(channel_id) {
            binding.take();
            tracing::debug!(identity, "connection unbound");
        }
    }

    /// Current live channel for `identity`; absence means offline.
    pub async fn resolve(&self, identity: &str) -> Option<Channel> {
        let slot = self.existing_slot(identity)?;
        let current = slot.lock().await.clone();
        current
    }

    /// Non-blocking resolve: returns the binding only when the identity's
    /// lock is free right now.
    ///
    /// Callers that may already hold a different identity's binding lock
    /// (receipt echoes fired from inside a dispatch) must use this instead
    /// of `resolve` so two opposite-direction submissions cannot wait on
    /// each other's locks.
    pub fn try_resolve(&self, identity: &str) -> Option<Channel> {
        let slot = self.existing_slot(identity)?;
        let binding = slot.try_lock().ok()?;
        binding.clone()
    }

    /// Whether `identity` has a live binding right now.
    pub async fn is_online(&self, identity: &str) -> bool {
        self.resolve(identity).await.is_some()
    }

    /// Identities with a live binding, sorted for stable output.
    pub async fn online_identities(&self) -> Vec<String> {
        let entries: Vec<(String, Slot)> = {
            let map = self.slots.read().expect("registry map lock poisoned");
            map.iter()
                .map(|(identity, slot)| (identity.clone(), slot.clone()))
                .collect()
        };
        let mut online = Vec::new();
        for (identity, slot) in entries {
            if slot.lock().await.is_some() {
                online.push(identity);
            }
        }
        online.sort();
        online
    }

    /// Drop map entries whose binding is gone. Returns how many were
    /// removed. Skips any slot that is currently locked.
    pub async fn sweep(&self) -> usize {
        let entries: Vec<(String, Slot)> = {
            let map = self.slots.read().expect("registry map lock poisoned");
            map.iter()
                .map(|(identity, slot)| (identity.clone(), slot.clone()))
                .collect()
        };
        let mut removed = 0;
        for (identity, slot) in entries {
            let mut map = self.slots.write().expect("registry map lock poisoned");
            let registered = map
                .get(&identity)
                .map(|current| Arc::ptr_eq(current, &slot))
                .unwrap_or(false);
            if !registered {
                continue;
            }
            // The map write lock is held, so nobody can fetch this slot
            // while we decide; a lock holder in flight makes try_lock fail
            // and the entry survives until the next sweep.
            if let Ok(binding) = slot.try_lock() {
                if binding.is_none() {
                    map.remove(&identity);
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            tracing::debug!(removed, "swept empty registry slots");
        }
        removed
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.read().expect("registry map lock poisoned").len()
    }
}

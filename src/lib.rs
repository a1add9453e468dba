//! Courier - Real-time Direct Messaging Core
//!
//! A point-to-point message router with per-user addressing, delivery
//! guarantees and read-state tracking. Acceptance is persist-then-dispatch:
//! a submitted message is durable before any delivery attempt, so a missed
//! recipient or a dropped connection never silently loses it.
//!
//! # Module Structure
//!
//! - **`shared`** - wire-visible types: the message shape, the delivery
//!   lifecycle, event frames and the error taxonomy
//! - **`backend`** - the router core (registry, store, router, tracker) and
//!   the Axum HTTP surface around it

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;

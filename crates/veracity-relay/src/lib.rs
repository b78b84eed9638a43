//! # Veracity Relay
//!
//! Delivery machinery between the three surfaces.
//!
//! ## Core Concepts
//!
//! - [`LocalBus`] - In-process [`MessageBus`](veracity_protocols::MessageBus)
//!   implementation with per-endpoint inboxes
//! - [`send_with_retry`] - Bounded retry with increasing delay; permanent
//!   failures short-circuit
//! - [`ConnectionHealth`] - The valid/invalidated state of a surface's bus
//!   connection, with idempotent teardown signaling
//! - [`SelectionGate`] - The debounce/dedup gate every selection source
//!   funnels through

mod gate;
mod health;
mod local;
mod retry;

pub use gate::{run_gate, SelectionGate};
pub use health::ConnectionHealth;
pub use local::LocalBus;
pub use retry::{send_with_retry, RetryConfig};

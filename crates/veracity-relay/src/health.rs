//! Connection validity tracking.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;
use tracing::info;

use veracity_protocols::error::DeliveryError;

/// The valid/invalidated state of a surface's connection to the host bus.
///
/// Starts valid. Invalidation is one-way for the surface's lifetime: once
/// the bus handle is gone (capability probe fails, or a send reports the
/// permanent kind), the surface must stop sending and tear down its
/// periodic listeners. A fresh load of the surface is the only way back.
pub struct ConnectionHealth {
    invalidated: AtomicBool,
    teardown: broadcast::Sender<()>,
}

impl ConnectionHealth {
    pub fn new() -> Self {
        let (teardown, _) = broadcast::channel(1);
        Self {
            invalidated: AtomicBool::new(false),
            teardown,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.invalidated.load(Ordering::SeqCst)
    }

    /// Transition to invalidated and fire the teardown signal. Idempotent:
    /// only the first call performs the transition; returns whether this
    /// call did.
    pub fn invalidate(&self) -> bool {
        let first = !self.invalidated.swap(true, Ordering::SeqCst);
        if first {
            info!("connection invalidated; tearing down listeners");
            let _ = self.teardown.send(());
        }
        first
    }

    /// Subscribe to the teardown signal. Fires once, on the first
    /// invalidation.
    pub fn on_teardown(&self) -> broadcast::Receiver<()> {
        self.teardown.subscribe()
    }

    /// Record a delivery outcome: the permanent kind invalidates.
    pub fn note(&self, err: &DeliveryError) {
        if err.is_permanent() {
            self.invalidate();
        }
    }
}

impl Default for ConnectionHealth {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veracity_protocols::bus::Endpoint;

    #[test]
    fn test_starts_valid() {
        let health = ConnectionHealth::new();
        assert!(health.is_valid());
    }

    #[test]
    fn test_invalidate_is_idempotent() {
        let health = ConnectionHealth::new();
        assert!(health.invalidate());
        assert!(!health.is_valid());
        // Second call is safe and performs no transition
        assert!(!health.invalidate());
        assert!(!health.is_valid());
    }

    #[tokio::test]
    async fn test_teardown_fires_on_first_invalidation() {
        let health = ConnectionHealth::new();
        let mut rx = health.on_teardown();
        health.invalidate();
        assert!(rx.recv().await.is_ok());
    }

    #[test]
    fn test_note_permanent_invalidates() {
        let health = ConnectionHealth::new();
        health.note(&DeliveryError::ChannelInvalidated(Endpoint::Coordinator));
        assert!(!health.is_valid());
    }

    #[test]
    fn test_note_transient_keeps_valid() {
        let health = ConnectionHealth::new();
        health.note(&DeliveryError::Transient("busy".to_string()));
        health.note(&DeliveryError::Exhausted { attempts: 4, reason: "busy".to_string() });
        assert!(health.is_valid());
    }
}

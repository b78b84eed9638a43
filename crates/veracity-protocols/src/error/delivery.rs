//! Delivery errors.
//!
//! The structured replacement for matching on host error strings: the kind
//! alone tells a caller whether retrying can ever succeed.

use thiserror::Error;

use crate::bus::Endpoint;

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The receiving endpoint's process no longer exists. Permanent for the
    /// sending surface's lifetime; retrying cannot succeed.
    #[error("Receiving end does not exist: {0}")]
    ChannelInvalidated(Endpoint),

    /// Any other delivery failure; retryable up to the configured bound.
    #[error("Delivery failed: {0}")]
    Transient(String),

    /// The retry bound was exhausted.
    #[error("Delivery failed after {attempts} attempts: {reason}")]
    Exhausted { attempts: u32, reason: String },
}

impl DeliveryError {
    /// Permanent failures must not be retried and invalidate the sender's
    /// connection to the bus.
    pub fn is_permanent(&self) -> bool {
        matches!(self, DeliveryError::ChannelInvalidated(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_invalidated_display() {
        let err = DeliveryError::ChannelInvalidated(Endpoint::Panel);
        let display = err.to_string();
        assert!(display.contains("Receiving end does not exist"));
        assert!(display.contains("panel"));
    }

    #[test]
    fn test_transient_display() {
        let err = DeliveryError::Transient("ack timeout".to_string());
        assert!(err.to_string().contains("ack timeout"));
    }

    #[test]
    fn test_exhausted_display() {
        let err = DeliveryError::Exhausted { attempts: 4, reason: "ack timeout".to_string() };
        let display = err.to_string();
        assert!(display.contains("4 attempts"));
        assert!(display.contains("ack timeout"));
    }

    #[test]
    fn test_is_permanent() {
        assert!(DeliveryError::ChannelInvalidated(Endpoint::Coordinator).is_permanent());
        assert!(!DeliveryError::Transient("busy".to_string()).is_permanent());
        assert!(!DeliveryError::Exhausted { attempts: 4, reason: "busy".to_string() }
            .is_permanent());
    }
}

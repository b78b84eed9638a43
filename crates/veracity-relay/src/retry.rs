//! Send retry and backoff.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use veracity_protocols::bus::{Endpoint, MessageBus};
use veracity_protocols::error::DeliveryError;
use veracity_protocols::message::{Ack, RelayMessage};

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    /// Delay after the given zero-based failed attempt. Linear schedule:
    /// 500ms, 1s, 1.5s for the defaults.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let millis = self.base_delay.as_millis() as u64 * (attempt as u64 + 1);
        Duration::from_millis(millis).min(self.max_delay)
    }

    /// Total attempts including the initial one.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Deliver `message`, retrying transient failures up to the configured
/// bound with increasing delay.
///
/// A permanent failure (the receiving end no longer exists) rejects
/// immediately - retrying cannot succeed. Exhausting the bound rejects with
/// [`DeliveryError::Exhausted`]; callers treat that as non-fatal and skip
/// the action, since the user can re-trigger it.
pub async fn send_with_retry(
    bus: &dyn MessageBus,
    from: Endpoint,
    to: Endpoint,
    message: RelayMessage,
    config: &RetryConfig,
) -> Result<Ack, DeliveryError> {
    let mut last_reason = String::new();

    for attempt in 0..config.total_attempts() {
        match bus.send(from, to, message.clone()).await {
            Ok(ack) => {
                if attempt > 0 {
                    debug!("delivered {} to {} on attempt {}", message.kind(), to, attempt + 1);
                }
                return Ok(ack);
            }
            Err(err) if err.is_permanent() => return Err(err),
            Err(err) => {
                last_reason = err.to_string();
                if attempt + 1 == config.total_attempts() {
                    break;
                }
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    "delivery of {} to {} failed (attempt {}/{}): {}, retrying in {:?}",
                    message.kind(),
                    to,
                    attempt + 1,
                    config.total_attempts(),
                    last_reason,
                    delay
                );
                sleep(delay).await;
            }
        }
    }

    Err(DeliveryError::Exhausted {
        attempts: config.total_attempts(),
        reason: last_reason,
    })
}

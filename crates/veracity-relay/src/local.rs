//! In-process message bus.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::debug;

use veracity_protocols::bus::{Endpoint, Envelope, MessageBus};
use veracity_protocols::error::DeliveryError;
use veracity_protocols::message::{Ack, RelayMessage};

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;

const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(1);

/// In-process [`MessageBus`]: each registered endpoint owns an mpsc inbox of
/// [`Envelope`]s. A send to an endpoint that was never registered, or whose
/// inbox has been dropped, reports the permanent `ChannelInvalidated` kind -
/// the "receiving end does not exist" case of the host bus.
pub struct LocalBus {
    endpoints: DashMap<Endpoint, mpsc::Sender<Envelope>>,
    ack_timeout: Duration,
    online: AtomicBool,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::with_ack_timeout(DEFAULT_ACK_TIMEOUT)
    }

    pub fn with_ack_timeout(ack_timeout: Duration) -> Self {
        Self {
            endpoints: DashMap::new(),
            ack_timeout,
            online: AtomicBool::new(true),
        }
    }

    /// Register an endpoint and take ownership of its inbox.
    ///
    /// Registering the same endpoint again replaces the previous inbox; the
    /// old receiver then reads to its end and closes.
    pub fn register(&self, endpoint: Endpoint, capacity: usize) -> mpsc::Receiver<Envelope> {
        let (tx, rx) = mpsc::channel(capacity);
        self.endpoints.insert(endpoint, tx);
        debug!("registered endpoint {}", endpoint);
        rx
    }

    /// Remove an endpoint. Subsequent sends to it fail permanently.
    pub fn unregister(&self, endpoint: Endpoint) {
        self.endpoints.remove(&endpoint);
        debug!("unregistered endpoint {}", endpoint);
    }

    /// Invalidate the whole bus handle: `probe()` turns false and every
    /// endpoint is dropped. Models extension reload.
    pub fn shutdown(&self) {
        self.online.store(false, Ordering::SeqCst);
        self.endpoints.clear();
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for LocalBus {
    async fn send(
        &self,
        from: Endpoint,
        to: Endpoint,
        message: RelayMessage,
    ) -> Result<Ack, DeliveryError> {
        if !self.probe() {
            return Err(DeliveryError::ChannelInvalidated(to));
        }

        let tx = self
            .endpoints
            .get(&to)
            .map(|entry| entry.value().clone())
            .ok_or(DeliveryError::ChannelInvalidated(to))?;

        let expects_ack = message.expects_ack();
        let (reply_tx, reply_rx) = oneshot::channel();

        tx.send(Envelope { from, message, reply: reply_tx })
            .await
            .map_err(|_| DeliveryError::ChannelInvalidated(to))?;

        if !expects_ack {
            // Fire-and-forget: delivery to the inbox is the whole contract.
            return Ok(Ack::none());
        }

        match timeout(self.ack_timeout, reply_rx).await {
            Ok(Ok(ack)) => Ok(ack),
            Ok(Err(_)) => Err(DeliveryError::Transient(format!(
                "{} closed the reply port without responding",
                to
            ))),
            Err(_) => Err(DeliveryError::Transient(format!(
                "no acknowledgement from {} within {:?}",
                to, self.ack_timeout
            ))),
        }
    }

    fn probe(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

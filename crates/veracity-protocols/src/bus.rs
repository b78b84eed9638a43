//! Messaging bus and host-action traits.
//!
//! The three surfaces never share memory; they communicate through a
//! host-provided bus addressed by [`Endpoint`]. Side-effecting host
//! operations (opening the panel, opening tabs) sit behind [`HostActions`]
//! so surfaces stay testable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::{DeliveryError, HostError};
use crate::message::{Ack, RelayMessage};

/// Logical surface addressed on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endpoint {
    /// Runs in the context of the visited page; observes selections.
    PageAgent,
    /// Background relay with no UI.
    Coordinator,
    /// The interactive results surface.
    Panel,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Endpoint::PageAgent => "page-agent",
            Endpoint::Coordinator => "coordinator",
            Endpoint::Panel => "panel",
        };
        write!(f, "{}", name)
    }
}

/// A message delivered to an endpoint's inbox, carrying its reply slot.
///
/// Dropping the reply slot without sending is how a receiver declines to
/// acknowledge; the bus reports that to a waiting sender as a transient
/// delivery failure.
#[derive(Debug)]
pub struct Envelope {
    pub from: Endpoint,
    pub message: RelayMessage,
    pub reply: oneshot::Sender<Ack>,
}

impl Envelope {
    /// Acknowledge this envelope. Ignores a sender that stopped waiting.
    pub fn ack(self, ack: Ack) {
        let _ = self.reply.send(ack);
    }
}

/// The host messaging bus.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Deliver `message` to `to` and wait for its acknowledgement (or the
    /// host's ack timeout, for message types that require one).
    async fn send(
        &self,
        from: Endpoint,
        to: Endpoint,
        message: RelayMessage,
    ) -> Result<Ack, DeliveryError>;

    /// Synchronous capability probe: false once the bus handle for this
    /// surface has been invalidated.
    fn probe(&self) -> bool;
}

/// Side-effecting host operations requested by the coordinator (and by the
/// panel's direct fallback path).
#[async_trait]
pub trait HostActions: Send + Sync {
    /// Bring the panel surface up for the active page.
    async fn open_panel(&self) -> Result<(), HostError>;

    /// Open a URL in a new tab.
    async fn open_tab(&self, url: &str) -> Result<(), HostError>;
}

//! Relay message definitions.
//!
//! Messages are the typed payloads exchanged between the three surfaces
//! (page agent, coordinator, panel) over the host messaging bus. The wire
//! encoding is a `type`-tagged JSON object; the tag names are part of the
//! protocol and must stay stable.

use serde::{Deserialize, Serialize};

use crate::verdict::{SourceRef, VerificationResult};

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

/// A typed payload exchanged between surfaces via the host messaging bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum RelayMessage {
    /// Liveness probe; any surface may answer.
    #[serde(rename = "PING")]
    Ping,

    /// Page agent -> coordinator: a new distinct selection was captured.
    #[serde(rename = "SELECTED_TEXT_FROM_CONTENT")]
    SelectedTextFromContent { text: String },

    /// Coordinator -> panel: relay of a captured selection.
    #[serde(rename = "SELECTED_TEXT")]
    SelectedText { text: String },

    /// Page agent -> coordinator: open the panel preloaded with a result.
    #[serde(rename = "OPEN_SIDE_PANEL_WITH_RESULT")]
    OpenSidePanelWithResult { data: VerificationResult },

    /// Coordinator -> panel: relay of an externally produced result.
    #[serde(rename = "FACTCHECK_RESULT")]
    FactcheckResult { data: VerificationResult },

    /// Panel -> coordinator: open each source in a new tab.
    #[serde(rename = "OPEN_SOURCES")]
    OpenSources { sources: Vec<SourceRef> },

    /// Panel -> page agent: what is currently selected?
    #[serde(rename = "GET_SELECTED_TEXT")]
    GetSelectedText,
}

impl RelayMessage {
    /// Wire name of the message type.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayMessage::Ping => "PING",
            RelayMessage::SelectedTextFromContent { .. } => "SELECTED_TEXT_FROM_CONTENT",
            RelayMessage::SelectedText { .. } => "SELECTED_TEXT",
            RelayMessage::OpenSidePanelWithResult { .. } => "OPEN_SIDE_PANEL_WITH_RESULT",
            RelayMessage::FactcheckResult { .. } => "FACTCHECK_RESULT",
            RelayMessage::OpenSources { .. } => "OPEN_SOURCES",
            RelayMessage::GetSelectedText => "GET_SELECTED_TEXT",
        }
    }

    /// Whether the protocol requires the receiver to acknowledge this
    /// message. Senders of the remaining types fire and forget.
    pub fn expects_ack(&self) -> bool {
        matches!(
            self,
            RelayMessage::Ping
                | RelayMessage::SelectedTextFromContent { .. }
                | RelayMessage::OpenSources { .. }
                | RelayMessage::GetSelectedText
        )
    }
}

/// Acknowledgement payload returned by a message receiver.
///
/// Untagged on the wire: the shape alone identifies the variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Ack {
    /// `OPEN_SOURCES` response: how many tabs were scheduled.
    Opened { status: String, opened: usize },
    /// `GET_SELECTED_TEXT` response. The text may be empty; the page agent
    /// always answers.
    Selection { text: String },
    /// Plain status response (`pong`, `received`, `error`).
    Status { status: String },
    /// No acknowledgement content (fire-and-forget deliveries).
    Empty {},
}

impl Ack {
    pub fn pong() -> Self {
        Ack::Status { status: "pong".to_string() }
    }

    pub fn received() -> Self {
        Ack::Status { status: "received".to_string() }
    }

    /// Internal-error status. Receivers answer with this rather than staying
    /// silent so the sender's retry logic does not misread an exception as a
    /// delivery failure.
    pub fn error() -> Self {
        Ack::Status { status: "error".to_string() }
    }

    pub fn opened(count: usize) -> Self {
        Ack::Opened { status: "success".to_string(), opened: count }
    }

    pub fn selection(text: impl Into<String>) -> Self {
        Ack::Selection { text: text.into() }
    }

    pub fn none() -> Self {
        Ack::Empty {}
    }

    pub fn is_pong(&self) -> bool {
        matches!(self, Ack::Status { status } if status == "pong")
    }

    pub fn is_received(&self) -> bool {
        matches!(self, Ack::Status { status } if status == "received")
    }

    /// Selected text carried by a `GET_SELECTED_TEXT` reply.
    pub fn text(&self) -> Option<&str> {
        match self {
            Ack::Selection { text } => Some(text),
            _ => None,
        }
    }

    /// Tab count carried by an `OPEN_SOURCES` reply.
    pub fn opened_count(&self) -> Option<usize> {
        match self {
            Ack::Opened { opened, .. } => Some(*opened),
            _ => None,
        }
    }
}

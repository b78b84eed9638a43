//! Selection debounce/dedup gate.
//!
//! The page agent listens on several overlapping event sources to maximize
//! capture reliability; all of them funnel through one gate so redundant
//! notifications collapse to a single forwarded selection.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::trace;

/// Dedup state shared by every selection source.
///
/// A selection passes only if its trimmed text has length > 1 and differs
/// from the immediately previous forwarded value.
#[derive(Debug)]
pub struct SelectionGate {
    window: Duration,
    last_forwarded: Option<String>,
}

impl SelectionGate {
    pub fn new(window: Duration) -> Self {
        Self { window, last_forwarded: None }
    }

    /// The trailing debounce window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Apply the dedup rules to a raw selection; returns the text to
    /// forward, if any.
    pub fn admit(&mut self, raw: &str) -> Option<String> {
        let text = raw.trim();
        if text.len() <= 1 {
            return None;
        }
        if self.last_forwarded.as_deref() == Some(text) {
            trace!("dropping repeated selection");
            return None;
        }
        let text = text.to_string();
        self.last_forwarded = Some(text.clone());
        Some(text)
    }

    /// The last forwarded selection.
    pub fn last(&self) -> Option<&str> {
        self.last_forwarded.as_deref()
    }

    pub fn reset(&mut self) {
        self.last_forwarded = None;
    }
}

/// Pump raw selection events through the gate.
///
/// Bursts arriving within the gate window collapse to their latest event
/// (trailing debounce); survivors of the dedup rules are emitted on `out`.
/// Returns when `raw` closes or `out` has no receiver left.
pub async fn run_gate(
    mut gate: SelectionGate,
    mut raw: mpsc::Receiver<String>,
    out: mpsc::Sender<String>,
) {
    'outer: while let Some(first) = raw.recv().await {
        let mut pending = first;
        // Trailing debounce: keep absorbing newer events until the window
        // passes without one.
        loop {
            match timeout(gate.window(), raw.recv()).await {
                Ok(Some(next)) => pending = next,
                Ok(None) => {
                    // Sources closed; flush what we have and stop.
                    if let Some(text) = gate.admit(&pending) {
                        let _ = out.send(text).await;
                    }
                    break 'outer;
                }
                Err(_) => break,
            }
        }
        if let Some(text) = gate.admit(&pending) {
            if out.send(text).await.is_err() {
                break;
            }
        }
    }
}

//! # Veracity Panel
//!
//! The interactive results surface: receives selections relayed by the
//! coordinator, owns the external verification call, and turns verdicts
//! into render events.
//!
//! ## Core Concepts
//!
//! - [`PanelController`] - Orchestration core: submit, auto-verify, request
//!   tokens, open sources, save reports
//! - [`Panel`] - Surface wiring: inbox loop plus the periodic fallback poll
//! - [`VerdictView`] - One verification result prepared for display
//! - [`ReportStore`] - The bounded, newest-first saved-report log

mod client;
mod controller;
mod store;
mod view;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};

use veracity_protocols::bus::Envelope;
use veracity_protocols::error::SurfaceError;
use veracity_protocols::message::{Ack, RelayMessage};

pub use client::VerifyClient;
pub use controller::{PanelConfig, PanelController, PanelEvent};
pub use store::ReportStore;
pub use view::{
    extract_domain, report_text, EvidenceView, SourceView, Support, Verdict, VerdictView,
    MAX_EVIDENCE, MAX_SOURCES,
};

/// The panel surface.
pub struct Panel {
    controller: Arc<PanelController>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl Panel {
    pub fn new(controller: Arc<PanelController>) -> Self {
        Self {
            controller,
            tasks: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    pub fn controller(&self) -> Arc<PanelController> {
        Arc::clone(&self.controller)
    }

    /// Start the inbox loop and the periodic selection poll.
    pub fn start(&self, mut inbox: mpsc::Receiver<Envelope>) -> Result<(), SurfaceError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SurfaceError::AlreadyStarted);
        }

        let mut tasks = Vec::new();

        {
            let controller = Arc::clone(&self.controller);
            tasks.push(tokio::spawn(async move {
                while let Some(envelope) = inbox.recv().await {
                    let Envelope { message, reply, .. } = envelope;
                    match message {
                        RelayMessage::SelectedText { text } => {
                            drop(reply);
                            Arc::clone(&controller).handle_selection(text);
                        }
                        RelayMessage::FactcheckResult { data } => {
                            drop(reply);
                            controller.show_result(data);
                        }
                        RelayMessage::Ping => {
                            let _ = reply.send(Ack::pong());
                        }
                        other => debug!("panel ignoring {}", other.kind()),
                    }
                }
                debug!("panel inbox closed");
            }));
        }

        // Fallback poll: one immediately on open, then on the interval.
        {
            let controller = Arc::clone(&self.controller);
            let interval = controller.config().poll_interval;
            tasks.push(tokio::spawn(async move {
                loop {
                    Arc::clone(&controller).poll_selection().await;
                    sleep(interval).await;
                }
            }));
        }

        *self.tasks.lock().unwrap() = tasks;
        info!("panel started");
        Ok(())
    }

    pub fn stop(&self) {
        let mut tasks = self.tasks.lock().unwrap();
        for task in tasks.drain(..) {
            task.abort();
        }
        debug!("panel stopped");
    }
}

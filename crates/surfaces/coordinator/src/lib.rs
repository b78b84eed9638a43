//! # Veracity Coordinator
//!
//! The background relay surface. Stateless: every message is handled on its
//! own, with two side-effecting host actions (open the panel, open source
//! tabs). Every message the protocol requires an answer for gets one, even
//! on internal error, so a sender's retry logic never misreads an exception
//! as a delivery failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use veracity_protocols::bus::{Endpoint, Envelope, HostActions, MessageBus};
use veracity_protocols::error::SurfaceError;
use veracity_protocols::message::{Ack, RelayMessage};
use veracity_protocols::verdict::SourceRef;
use veracity_relay::{send_with_retry, RetryConfig};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Coordinator configuration.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Stagger between source tabs, to avoid overwhelming the host's
    /// tab-creation rate limits.
    pub source_stagger: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self { source_stagger: Duration::from_millis(300) }
    }
}

/// The coordinator surface.
pub struct Coordinator {
    bus: Arc<dyn MessageBus>,
    host: Arc<dyn HostActions>,
    config: CoordinatorConfig,
    retry: RetryConfig,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl Coordinator {
    pub fn new(
        bus: Arc<dyn MessageBus>,
        host: Arc<dyn HostActions>,
        config: CoordinatorConfig,
        retry: RetryConfig,
    ) -> Self {
        Self {
            bus,
            host,
            config,
            retry,
            tasks: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Start draining the inbox.
    pub fn start(&self, mut inbox: mpsc::Receiver<Envelope>) -> Result<(), SurfaceError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SurfaceError::AlreadyStarted);
        }

        let bus = Arc::clone(&self.bus);
        let host = Arc::clone(&self.host);
        let config = self.config.clone();
        let retry = self.retry.clone();

        let task = tokio::spawn(async move {
            while let Some(envelope) = inbox.recv().await {
                let bus = Arc::clone(&bus);
                let host = Arc::clone(&host);
                let config = config.clone();
                let retry = retry.clone();
                // Each message is independent; a slow host action must not
                // block the inbox.
                tokio::spawn(async move {
                    handle_message(bus, host, config, retry, envelope).await;
                });
            }
            debug!("coordinator inbox closed");
        });

        self.tasks.lock().unwrap().push(task);
        info!("coordinator started");
        Ok(())
    }

    /// Stop the relay.
    pub fn stop(&self) {
        let mut tasks = self.tasks.lock().unwrap();
        for task in tasks.drain(..) {
            task.abort();
        }
        debug!("coordinator stopped");
    }
}

async fn handle_message(
    bus: Arc<dyn MessageBus>,
    host: Arc<dyn HostActions>,
    config: CoordinatorConfig,
    retry: RetryConfig,
    envelope: Envelope,
) {
    let Envelope { from, message, reply } = envelope;
    debug!("coordinator received {} from {}", message.kind(), from);

    match message {
        RelayMessage::Ping => {
            let _ = reply.send(Ack::pong());
        }

        RelayMessage::SelectedTextFromContent { text } => {
            // Ack first: the relay downstream may fail, but the page agent's
            // send has succeeded either way.
            let _ = reply.send(Ack::received());

            if let Err(err) = host.open_panel().await {
                warn!("failed to open panel: {}", err);
            }
            let relayed = RelayMessage::SelectedText { text };
            if let Err(err) = send_with_retry(
                bus.as_ref(),
                Endpoint::Coordinator,
                Endpoint::Panel,
                relayed,
                &retry,
            )
            .await
            {
                // Non-fatal: the user can re-select
                warn!("failed to relay selection to panel: {}", err);
            }
        }

        RelayMessage::OpenSidePanelWithResult { data } => {
            drop(reply);
            match host.open_panel().await {
                Ok(()) => {
                    let relayed = RelayMessage::FactcheckResult { data };
                    if let Err(err) = send_with_retry(
                        bus.as_ref(),
                        Endpoint::Coordinator,
                        Endpoint::Panel,
                        relayed,
                        &retry,
                    )
                    .await
                    {
                        warn!("failed to relay result to panel: {}", err);
                    }
                }
                Err(err) => warn!("failed to open panel: {}", err),
            }
        }

        RelayMessage::OpenSources { sources } => {
            let count = sources.len();
            // Answer immediately with the scheduled count; the tabs open in
            // the background on the staggered schedule.
            let _ = reply.send(Ack::opened(count));
            open_sources_staggered(host, sources, config.source_stagger).await;
        }

        other => {
            // Not addressed to this surface. Answer rather than stay silent
            // so the sender is not left retrying.
            debug!("coordinator ignoring {}", other.kind());
            let _ = reply.send(Ack::error());
        }
    }
}

async fn open_sources_staggered(
    host: Arc<dyn HostActions>,
    sources: Vec<SourceRef>,
    stagger: Duration,
) {
    for (index, source) in sources.into_iter().enumerate() {
        if index > 0 {
            sleep(stagger).await;
        }
        debug!("opening source {}: {} - {}", index + 1, source.title, source.url);
        if let Err(err) = host.open_tab(&source.url).await {
            warn!("failed to open tab for {}: {}", source.url, err);
        }
    }
}

//! # Veracity Page Agent
//!
//! The surface that runs in the context of the visited page: observes text
//! selections through pluggable sources, funnels them through the
//! debounce/dedup gate, and forwards each distinct selection to the
//! coordinator. Answers `PING` and `GET_SELECTED_TEXT`, and monitors its own
//! connection to the bus, tearing everything down once it is invalidated.

mod sources;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use veracity_protocols::bus::{Endpoint, Envelope, MessageBus};
use veracity_protocols::error::SurfaceError;
use veracity_protocols::message::{Ack, RelayMessage};
use veracity_relay::{run_gate, send_with_retry, ConnectionHealth, RetryConfig, SelectionGate};

pub use sources::{ChannelSource, PollSource, SelectionSnapshot, SelectionSource};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Page agent configuration.
#[derive(Debug, Clone)]
pub struct PageAgentConfig {
    /// Initial capability-probe interval.
    pub monitor_start: Duration,
    /// Probe interval ceiling; each healthy tick stretches toward it.
    pub monitor_max: Duration,
    /// Round-trip ping cadence.
    pub ping_interval: Duration,
    /// Trailing debounce window of the selection gate.
    pub debounce: Duration,
}

impl Default for PageAgentConfig {
    fn default() -> Self {
        Self {
            monitor_start: Duration::from_secs(1),
            monitor_max: Duration::from_secs(5),
            ping_interval: Duration::from_secs(10),
            debounce: Duration::from_millis(50),
        }
    }
}

/// The page agent surface. All listener state lives here; `start()` wires
/// it up and `dispose()` tears it down.
pub struct PageAgent {
    bus: Arc<dyn MessageBus>,
    config: PageAgentConfig,
    retry: RetryConfig,
    health: Arc<ConnectionHealth>,
    /// Last raw selection observed, answered to `GET_SELECTED_TEXT`.
    current: Arc<RwLock<String>>,
    sources: Mutex<Vec<Arc<dyn SelectionSource>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl PageAgent {
    pub fn new(bus: Arc<dyn MessageBus>, config: PageAgentConfig, retry: RetryConfig) -> Self {
        Self {
            bus,
            config,
            retry,
            health: Arc::new(ConnectionHealth::new()),
            current: Arc::new(RwLock::new(String::new())),
            sources: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Register a selection source. Must happen before `start()`.
    pub fn add_source(&self, source: Arc<dyn SelectionSource>) {
        self.sources.lock().unwrap().push(source);
    }

    pub fn health(&self) -> Arc<ConnectionHealth> {
        Arc::clone(&self.health)
    }

    /// Wire up the surface: source pumps, the gate, the forwarder, the
    /// inbox, and the context monitors.
    pub fn start(&self, inbox: mpsc::Receiver<Envelope>) -> Result<(), SurfaceError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SurfaceError::AlreadyStarted);
        }

        let mut tasks = Vec::new();

        // Every source feeds one raw channel.
        let (raw_tx, mut raw_rx) = mpsc::channel::<String>(64);
        let sources: Vec<Arc<dyn SelectionSource>> =
            self.sources.lock().unwrap().drain(..).collect();
        for source in sources {
            let events = raw_tx.clone();
            let shutdown = self.health.on_teardown();
            debug!("starting selection source {}", source.id());
            tasks.push(tokio::spawn(async move {
                source.run(events, shutdown).await;
            }));
        }
        drop(raw_tx);

        // Tee raw events into the live selection before gating, so
        // GET_SELECTED_TEXT answers what the page shows right now.
        let (gate_tx, gate_rx) = mpsc::channel::<String>(64);
        {
            let current = Arc::clone(&self.current);
            tasks.push(tokio::spawn(async move {
                while let Some(text) = raw_rx.recv().await {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        *current.write().unwrap() = trimmed.to_string();
                    }
                    if gate_tx.send(text).await.is_err() {
                        break;
                    }
                }
            }));
        }

        let (gated_tx, mut gated_rx) = mpsc::channel::<String>(16);
        tasks.push(tokio::spawn(run_gate(
            SelectionGate::new(self.config.debounce),
            gate_rx,
            gated_tx,
        )));

        // Forward each gated selection to the coordinator.
        {
            let bus = Arc::clone(&self.bus);
            let retry = self.retry.clone();
            let health = Arc::clone(&self.health);
            tasks.push(tokio::spawn(async move {
                let mut teardown = health.on_teardown();
                loop {
                    tokio::select! {
                        next = gated_rx.recv() => {
                            let Some(text) = next else { break };
                            if !health.is_valid() {
                                break;
                            }
                            let message = RelayMessage::SelectedTextFromContent { text };
                            match send_with_retry(
                                bus.as_ref(),
                                Endpoint::PageAgent,
                                Endpoint::Coordinator,
                                message,
                                &retry,
                            )
                            .await
                            {
                                Ok(_) => {}
                                Err(err) => {
                                    health.note(&err);
                                    warn!("failed to forward selection: {}", err);
                                }
                            }
                        }
                        _ = teardown.recv() => break,
                    }
                }
            }));
        }

        // Inbox: answer probes and selection queries, relay pushed results.
        {
            let bus = Arc::clone(&self.bus);
            let retry = self.retry.clone();
            let health = Arc::clone(&self.health);
            let current = Arc::clone(&self.current);
            let mut inbox = inbox;
            tasks.push(tokio::spawn(async move {
                let mut teardown = health.on_teardown();
                loop {
                    tokio::select! {
                        next = inbox.recv() => {
                            let Some(envelope) = next else { break };
                            if !health.is_valid() {
                                debug!("connection invalidated, ignoring message");
                                continue;
                            }
                            let Envelope { message, reply, .. } = envelope;
                            match message {
                                RelayMessage::Ping => {
                                    let _ = reply.send(Ack::pong());
                                }
                                RelayMessage::GetSelectedText => {
                                    let text = current.read().unwrap().clone();
                                    // Always answer, even when empty
                                    let _ = reply.send(Ack::selection(text));
                                }
                                RelayMessage::FactcheckResult { data } => {
                                    drop(reply);
                                    let message =
                                        RelayMessage::OpenSidePanelWithResult { data };
                                    if let Err(err) = send_with_retry(
                                        bus.as_ref(),
                                        Endpoint::PageAgent,
                                        Endpoint::Coordinator,
                                        message,
                                        &retry,
                                    )
                                    .await
                                    {
                                        health.note(&err);
                                        warn!("failed to open panel with result: {}", err);
                                    }
                                }
                                other => debug!("page agent ignoring {}", other.kind()),
                            }
                        }
                        _ = teardown.recv() => break,
                    }
                }
            }));
        }

        // Capability monitor: stretches its interval while the connection
        // stays healthy.
        {
            let bus = Arc::clone(&self.bus);
            let health = Arc::clone(&self.health);
            let start = self.config.monitor_start;
            let max = self.config.monitor_max;
            tasks.push(tokio::spawn(async move {
                let mut teardown = health.on_teardown();
                let mut interval = start;
                loop {
                    tokio::select! {
                        _ = sleep(interval) => {
                            if !bus.probe() {
                                health.invalidate();
                                break;
                            }
                            interval = stretch(interval, max);
                        }
                        _ = teardown.recv() => break,
                    }
                }
            }));
        }

        // Round-trip tester: an actual message through the bus.
        {
            let bus = Arc::clone(&self.bus);
            let health = Arc::clone(&self.health);
            let interval = self.config.ping_interval;
            tasks.push(tokio::spawn(async move {
                let mut teardown = health.on_teardown();
                loop {
                    tokio::select! {
                        _ = sleep(interval) => {
                            match bus
                                .send(Endpoint::PageAgent, Endpoint::Coordinator, RelayMessage::Ping)
                                .await
                            {
                                Ok(ack) if ack.is_pong() => {}
                                Ok(ack) => debug!("unexpected ping reply: {:?}", ack),
                                Err(err) => {
                                    health.note(&err);
                                    if err.is_permanent() {
                                        break;
                                    }
                                    debug!("ping failed: {}", err);
                                }
                            }
                        }
                        _ = teardown.recv() => break,
                    }
                }
            }));
        }

        *self.tasks.lock().unwrap() = tasks;
        info!("page agent started");
        Ok(())
    }

    /// Tear down every listener. Safe to invoke multiple times; there is no
    /// way back to a valid connection within this surface's lifetime.
    pub fn dispose(&self) {
        self.health.invalidate();
        let mut tasks = self.tasks.lock().unwrap();
        for task in tasks.drain(..) {
            task.abort();
        }
        debug!("page agent disposed");
    }

    /// Last raw selection the agent has observed.
    pub fn current_selection(&self) -> String {
        self.current.read().unwrap().clone()
    }
}

fn stretch(current: Duration, max: Duration) -> Duration {
    let next = current.mul_f64(1.1);
    if next > max { max } else { next }
}

//! Panel orchestration.
//!
//! Owns the single external call to the verification service and the state
//! of the current verification cycle. Consumers subscribe to
//! [`PanelEvent`]s and render them however they like.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, warn};

use veracity_protocols::bus::{Endpoint, HostActions, MessageBus};
use veracity_protocols::error::StoreError;
use veracity_protocols::message::RelayMessage;
use veracity_protocols::report::SavedReport;
use veracity_protocols::verdict::{SourceRef, VerificationResult};
use veracity_relay::{send_with_retry, RetryConfig};

use crate::client::VerifyClient;
use crate::store::ReportStore;
use crate::view::{report_text, VerdictView};

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;

/// Panel configuration.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Pause between a new selection and its automatic verification, so the
    /// highlighted-text affordance renders first.
    pub auto_verify_delay: Duration,
    /// Fallback poll of the page agent for the current selection.
    pub poll_interval: Duration,
    /// Stagger for the panel's direct fallback tab opener.
    pub fallback_stagger: Duration,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            auto_verify_delay: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(2000),
            fallback_stagger: Duration::from_millis(200),
        }
    }
}

/// What the panel wants rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    /// A new selection arrived; show the highlighted-text affordance.
    SelectionHighlighted(String),
    /// The selection went away; hide the affordance.
    SelectionCleared,
    /// A verification call is in flight.
    Loading,
    /// Empty input rejected before any network call.
    InputRejected(String),
    /// A verdict to render.
    Verdict(VerdictView),
    /// The service call failed; the previous verdict, if any, still stands.
    VerifyFailed(String),
    /// Informational notice.
    Notice(String),
    ReportSaved,
    SourcesOpened(usize),
}

#[derive(Default)]
struct PanelState {
    current_text: String,
    current: Option<VerificationResult>,
    loading: bool,
    latest_token: u64,
}

/// The panel's orchestration core.
pub struct PanelController {
    bus: Arc<dyn MessageBus>,
    client: VerifyClient,
    store: ReportStore,
    config: PanelConfig,
    retry: RetryConfig,
    /// Direct opener used when the coordinator relay fails.
    fallback_host: Option<Arc<dyn HostActions>>,
    state: Mutex<PanelState>,
    /// Monotonic request tokens; a response is only applied while its token
    /// is still the latest issued.
    tokens: AtomicU64,
    events: broadcast::Sender<PanelEvent>,
}

impl PanelController {
    pub fn new(
        bus: Arc<dyn MessageBus>,
        client: VerifyClient,
        store: ReportStore,
        config: PanelConfig,
        retry: RetryConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            bus,
            client,
            store,
            config,
            retry,
            fallback_host: None,
            state: Mutex::new(PanelState::default()),
            tokens: AtomicU64::new(0),
            events,
        }
    }

    /// Attach a direct tab opener for the coordinator-unavailable fallback.
    pub fn with_fallback_host(mut self, host: Arc<dyn HostActions>) -> Self {
        self.fallback_host = Some(host);
        self
    }

    /// Subscribe to render events.
    pub fn events(&self) -> broadcast::Receiver<PanelEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Text of the current verification cycle.
    pub fn current_text(&self) -> String {
        self.state.lock().unwrap().current_text.clone()
    }

    /// Result of the current verification cycle, if one has completed.
    pub fn current_result(&self) -> Option<VerificationResult> {
        self.state.lock().unwrap().current.clone()
    }

    fn emit(&self, event: PanelEvent) {
        let _ = self.events.send(event);
    }

    fn next_token(&self) -> u64 {
        self.tokens.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// A selection arrived (relay or poll): highlight it and schedule the
    /// automatic verification. A newer selection supersedes both the pending
    /// timer and any in-flight call.
    pub fn handle_selection(self: Arc<Self>, text: String) {
        let trimmed = text.trim().to_string();
        if trimmed.is_empty() {
            self.emit(PanelEvent::SelectionCleared);
            return;
        }

        {
            let mut state = self.state.lock().unwrap();
            state.latest_token = self.next_token();
            state.loading = false;
            state.current_text = trimmed.clone();
        }
        self.emit(PanelEvent::SelectionHighlighted(trimmed.clone()));

        let delay = self.config.auto_verify_delay;
        let this = Arc::clone(&self);
        tokio::spawn(async move {
            sleep(delay).await;
            // Superseded while the affordance was rendering?
            if this.state.lock().unwrap().current_text != trimmed {
                debug!("auto-verify skipped; selection superseded");
                return;
            }
            this.submit_for_verification(&trimmed).await;
        });
    }

    /// An externally produced result pushed through the coordinator.
    pub fn show_result(&self, result: VerificationResult) {
        let view = VerdictView::from(&result);
        {
            let mut state = self.state.lock().unwrap();
            // Replaces the current cycle entirely
            state.latest_token = self.next_token();
            state.loading = false;
            state.current = Some(result);
        }
        self.emit(PanelEvent::Verdict(view));
    }

    /// Submit text to the verification service and render the outcome.
    ///
    /// At most one request is outstanding per text; a duplicate submission
    /// while it is in flight is dropped. A submission for different text
    /// supersedes: the older response's token goes stale and its result is
    /// discarded on arrival.
    pub async fn submit_for_verification(&self, raw: &str) {
        let text = raw.trim().to_string();
        if text.is_empty() {
            self.emit(PanelEvent::InputRejected(
                "Please enter some text to verify".to_string(),
            ));
            return;
        }

        let token;
        {
            let mut state = self.state.lock().unwrap();
            if state.loading && state.current_text == text {
                debug!("verification already in flight; ignoring duplicate");
                return;
            }
            token = self.next_token();
            state.latest_token = token;
            state.loading = true;
            state.current_text = text.clone();
        }
        self.emit(PanelEvent::Loading);

        let outcome = self.client.check(&text).await;

        let event = {
            let mut state = self.state.lock().unwrap();
            if state.latest_token != token {
                debug!("discarding stale verification response");
                return;
            }
            state.loading = false;
            match outcome {
                Ok(result) => {
                    let view = VerdictView::from(&result);
                    state.current = Some(result);
                    PanelEvent::Verdict(view)
                }
                // The previous result, if any, stays untouched
                Err(err) => PanelEvent::VerifyFailed(format!("Error: {}", err)),
            }
        };
        self.emit(event);
    }

    /// Open every openable source of the current result: ask the
    /// coordinator, fall back to opening directly if the relay fails.
    pub async fn open_all_sources(&self) {
        let sources: Vec<SourceRef> = {
            let state = self.state.lock().unwrap();
            state
                .current
                .as_ref()
                .map(|result| result.sources.clone())
                .unwrap_or_default()
        };
        let sources: Vec<SourceRef> =
            sources.into_iter().filter(|source| source.is_openable()).collect();

        if sources.is_empty() {
            self.emit(PanelEvent::Notice(
                "No sources found to open. Verify some text first.".to_string(),
            ));
            return;
        }

        let count = sources.len();
        let message = RelayMessage::OpenSources { sources: sources.clone() };
        match send_with_retry(
            self.bus.as_ref(),
            Endpoint::Panel,
            Endpoint::Coordinator,
            message,
            &self.retry,
        )
        .await
        {
            Ok(ack) => {
                self.emit(PanelEvent::SourcesOpened(ack.opened_count().unwrap_or(count)));
            }
            Err(err) => {
                warn!("coordinator relay failed, opening sources directly: {}", err);
                let Some(host) = &self.fallback_host else {
                    self.emit(PanelEvent::Notice(format!("Could not open sources: {}", err)));
                    return;
                };
                for (index, source) in sources.iter().enumerate() {
                    if index > 0 {
                        sleep(self.config.fallback_stagger).await;
                    }
                    if let Err(err) = host.open_tab(&source.url).await {
                        warn!("failed to open tab for {}: {}", source.url, err);
                    }
                }
                self.emit(PanelEvent::SourcesOpened(count));
            }
        }
    }

    /// Snapshot the current verdict into the bounded report log.
    pub async fn save_report(&self) -> Result<(), StoreError> {
        let snapshot = {
            let state = self.state.lock().unwrap();
            state
                .current
                .as_ref()
                .map(|result| (state.current_text.clone(), result.clone()))
        };
        let Some((text, result)) = snapshot else {
            self.emit(PanelEvent::Notice("Nothing to save yet".to_string()));
            return Ok(());
        };

        let view = VerdictView::from(&result);
        let report = SavedReport::new(
            text,
            view.verdict.as_str(),
            result.analysis.confidence,
            view.explanation.clone(),
        );
        self.store.save(report).await?;
        self.emit(PanelEvent::ReportSaved);
        Ok(())
    }

    /// Plain-text report of the current verdict, if any.
    pub fn current_report_text(&self) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .current
            .as_ref()
            .map(|result| report_text(&state.current_text, &VerdictView::from(result)))
    }

    /// One fallback poll of the page agent for the current selection.
    /// Failures are silent; this is only a safety net.
    pub async fn poll_selection(self: Arc<Self>) {
        let ack = send_with_retry(
            self.bus.as_ref(),
            Endpoint::Panel,
            Endpoint::PageAgent,
            RelayMessage::GetSelectedText,
            &self.retry,
        )
        .await;

        match ack {
            Ok(ack) => {
                if let Some(text) = ack.text() {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() && trimmed != self.current_text() {
                        Arc::clone(&self).handle_selection(trimmed.to_string());
                    }
                }
            }
            Err(err) => debug!("selection poll failed: {}", err),
        }
    }
}

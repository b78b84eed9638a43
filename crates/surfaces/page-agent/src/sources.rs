//! Selection sources.
//!
//! Selection activity surfaces through many overlapping events (pointer-up,
//! key-up, selection-change, touch-end, focus, a periodic poll) and no
//! single one fires reliably across pages, so the agent listens on several
//! [`SelectionSource`]s at once and funnels all of them through the one
//! debounce/dedup gate.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

/// A raw producer of selection text.
#[async_trait]
pub trait SelectionSource: Send + Sync {
    /// Identifier for logs.
    fn id(&self) -> &str;

    /// Emit raw selections into `events` until the channel closes or
    /// `shutdown` fires.
    async fn run(&self, events: mpsc::Sender<String>, shutdown: broadcast::Receiver<()>);
}

/// Synchronous view of what is currently selected (a page, a clipboard,
/// whatever the embedder watches).
pub trait SelectionSnapshot: Send + Sync {
    fn current_selection(&self) -> Option<String>;
}

/// Periodic fallback poll of a [`SelectionSnapshot`].
pub struct PollSource {
    snapshot: Arc<dyn SelectionSnapshot>,
    interval: Duration,
}

impl PollSource {
    pub fn new(snapshot: Arc<dyn SelectionSnapshot>, interval: Duration) -> Self {
        Self { snapshot, interval }
    }
}

#[async_trait]
impl SelectionSource for PollSource {
    fn id(&self) -> &str {
        "poll"
    }

    async fn run(&self, events: mpsc::Sender<String>, mut shutdown: broadcast::Receiver<()>) {
        let mut tick = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Some(text) = self.snapshot.current_selection() {
                        if events.send(text).await.is_err() {
                            break;
                        }
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    }
}

/// Adapter for push-style events (an interactive input stream, a test
/// driver). Consumes its receiver on first run.
pub struct ChannelSource {
    id: String,
    receiver: Mutex<Option<mpsc::Receiver<String>>>,
}

impl ChannelSource {
    pub fn new(id: impl Into<String>, receiver: mpsc::Receiver<String>) -> Self {
        Self { id: id.into(), receiver: Mutex::new(Some(receiver)) }
    }
}

#[async_trait]
impl SelectionSource for ChannelSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self, events: mpsc::Sender<String>, mut shutdown: broadcast::Receiver<()>) {
        let taken = self.receiver.lock().unwrap().take();
        let Some(mut receiver) = taken else {
            warn!("selection source {} already consumed", self.id);
            return;
        };
        loop {
            tokio::select! {
                next = receiver.recv() => match next {
                    Some(text) => {
                        if events.send(text).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                _ = shutdown.recv() => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSnapshot(&'static str);

    impl SelectionSnapshot for FixedSnapshot {
        fn current_selection(&self) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_poll_source_emits_snapshot() {
        let source = PollSource::new(Arc::new(FixedSnapshot("picked")), Duration::from_millis(5));
        let (events_tx, mut events_rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(async move {
            source.run(events_tx, shutdown_rx).await;
        });

        assert_eq!(events_rx.recv().await, Some("picked".to_string()));
        let _ = shutdown_tx.send(());
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_source_forwards_and_closes() {
        let (in_tx, in_rx) = mpsc::channel(4);
        let source = ChannelSource::new("test", in_rx);
        let (events_tx, mut events_rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

        let task = tokio::spawn(async move {
            source.run(events_tx, shutdown_rx).await;
        });

        in_tx.send("one two".to_string()).await.unwrap();
        assert_eq!(events_rx.recv().await, Some("one two".to_string()));
        drop(in_tx);

        task.await.unwrap();
        assert_eq!(events_rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_channel_source_single_consumption() {
        let (_in_tx, in_rx) = mpsc::channel::<String>(4);
        let source = ChannelSource::new("test", in_rx);
        let (events_tx, _events_rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

        {
            let guard = source.receiver.lock().unwrap();
            assert!(guard.is_some());
        }
        source.receiver.lock().unwrap().take();
        // Second run finds the receiver gone and returns immediately
        source.run(events_tx, shutdown_rx).await;
    }
}

use super::*;

use veracity_relay::LocalBus;

fn test_config() -> PageAgentConfig {
    PageAgentConfig {
        monitor_start: Duration::from_millis(10),
        monitor_max: Duration::from_millis(50),
        ping_interval: Duration::from_secs(30),
        debounce: Duration::from_millis(20),
    }
}

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 1,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

/// Ack everything the coordinator is supposed to answer.
fn spawn_coordinator_stub(mut inbox: mpsc::Receiver<Envelope>) {
    tokio::spawn(async move {
        while let Some(envelope) = inbox.recv().await {
            let Envelope { message, reply, .. } = envelope;
            match message {
                RelayMessage::Ping => {
                    let _ = reply.send(Ack::pong());
                }
                RelayMessage::SelectedTextFromContent { .. } => {
                    let _ = reply.send(Ack::received());
                }
                _ => {}
            }
        }
    });
}

#[test]
fn test_config_defaults() {
    let config = PageAgentConfig::default();
    assert_eq!(config.monitor_start, Duration::from_secs(1));
    assert_eq!(config.monitor_max, Duration::from_secs(5));
    assert_eq!(config.ping_interval, Duration::from_secs(10));
    assert_eq!(config.debounce, Duration::from_millis(50));
}

#[test]
fn test_stretch_caps_at_max() {
    let max = Duration::from_millis(500);
    let mut interval = Duration::from_millis(100);
    for _ in 0..50 {
        interval = stretch(interval, max);
        assert!(interval <= max);
    }
    assert_eq!(interval, max);
}

#[tokio::test]
async fn test_forwards_distinct_selection_once() {
    let bus = Arc::new(LocalBus::new());
    let mut coordinator = bus.register(Endpoint::Coordinator, 16);
    let agent_inbox = bus.register(Endpoint::PageAgent, 16);

    let (selections, selections_rx) = mpsc::channel(8);
    let agent = PageAgent::new(
        Arc::clone(&bus) as Arc<dyn MessageBus>,
        test_config(),
        fast_retry(),
    );
    agent.add_source(Arc::new(ChannelSource::new("test", selections_rx)));
    agent.start(agent_inbox).unwrap();

    selections.send("the claim".to_string()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    // Redundant event source fires again for the identical selection
    selections.send("the claim".to_string()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;

    let envelope = coordinator.recv().await.unwrap();
    assert_eq!(
        envelope.message,
        RelayMessage::SelectedTextFromContent { text: "the claim".to_string() }
    );
    envelope.ack(Ack::received());

    // No second forward for the duplicate
    let second = tokio::time::timeout(Duration::from_millis(150), coordinator.recv()).await;
    assert!(second.is_err());

    agent.dispose();
}

#[tokio::test]
async fn test_answers_ping_and_selection_query() {
    let bus = Arc::new(LocalBus::new());
    let coordinator = bus.register(Endpoint::Coordinator, 16);
    spawn_coordinator_stub(coordinator);
    let agent_inbox = bus.register(Endpoint::PageAgent, 16);

    let (selections, selections_rx) = mpsc::channel(8);
    let agent = PageAgent::new(
        Arc::clone(&bus) as Arc<dyn MessageBus>,
        test_config(),
        fast_retry(),
    );
    agent.add_source(Arc::new(ChannelSource::new("test", selections_rx)));
    agent.start(agent_inbox).unwrap();

    let ack = bus
        .send(Endpoint::Panel, Endpoint::PageAgent, RelayMessage::Ping)
        .await
        .unwrap();
    assert!(ack.is_pong());

    // Empty before anything is selected, but always answered
    let ack = bus
        .send(Endpoint::Panel, Endpoint::PageAgent, RelayMessage::GetSelectedText)
        .await
        .unwrap();
    assert_eq!(ack.text(), Some(""));

    selections.send("  observed text  ".to_string()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;

    let ack = bus
        .send(Endpoint::Panel, Endpoint::PageAgent, RelayMessage::GetSelectedText)
        .await
        .unwrap();
    assert_eq!(ack.text(), Some("observed text"));
    assert_eq!(agent.current_selection(), "observed text");

    agent.dispose();
}

#[tokio::test]
async fn test_forward_failure_invalidates_connection() {
    let bus = Arc::new(LocalBus::new());
    // Coordinator never registered: the receiving end does not exist
    let agent_inbox = bus.register(Endpoint::PageAgent, 16);

    let (selections, selections_rx) = mpsc::channel(8);
    let agent = PageAgent::new(
        Arc::clone(&bus) as Arc<dyn MessageBus>,
        test_config(),
        fast_retry(),
    );
    agent.add_source(Arc::new(ChannelSource::new("test", selections_rx)));
    agent.start(agent_inbox).unwrap();

    assert!(agent.health().is_valid());
    selections.send("the claim".to_string()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!agent.health().is_valid());
}

#[tokio::test]
async fn test_monitor_invalidates_when_probe_fails() {
    let bus = Arc::new(LocalBus::new());
    let coordinator = bus.register(Endpoint::Coordinator, 16);
    spawn_coordinator_stub(coordinator);
    let agent_inbox = bus.register(Endpoint::PageAgent, 16);

    let agent = PageAgent::new(
        Arc::clone(&bus) as Arc<dyn MessageBus>,
        test_config(),
        fast_retry(),
    );
    agent.start(agent_inbox).unwrap();
    assert!(agent.health().is_valid());

    // Extension reload: the bus handle goes away
    bus.shutdown();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!agent.health().is_valid());
}

#[tokio::test]
async fn test_dispose_is_idempotent() {
    let bus = Arc::new(LocalBus::with_ack_timeout(Duration::from_millis(50)));
    let coordinator = bus.register(Endpoint::Coordinator, 16);
    spawn_coordinator_stub(coordinator);
    let agent_inbox = bus.register(Endpoint::PageAgent, 16);

    let agent = PageAgent::new(
        Arc::clone(&bus) as Arc<dyn MessageBus>,
        test_config(),
        fast_retry(),
    );
    agent.start(agent_inbox).unwrap();

    agent.dispose();
    agent.dispose();
    assert!(!agent.health().is_valid());

    // The disposed surface no longer answers
    let result = bus
        .send(Endpoint::Panel, Endpoint::PageAgent, RelayMessage::Ping)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_start_twice_rejected() {
    let bus = Arc::new(LocalBus::new());
    let first_inbox = bus.register(Endpoint::PageAgent, 16);
    let agent = PageAgent::new(
        Arc::clone(&bus) as Arc<dyn MessageBus>,
        test_config(),
        fast_retry(),
    );
    agent.start(first_inbox).unwrap();

    let second_inbox = bus.register(Endpoint::PageAgent, 16);
    let err = agent.start(second_inbox).unwrap_err();
    assert!(matches!(err, SurfaceError::AlreadyStarted));
    agent.dispose();
}

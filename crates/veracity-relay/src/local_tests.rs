use super::*;

use tokio::task;

async fn answer_next(mut inbox: mpsc::Receiver<Envelope>, ack: Ack) {
    if let Some(envelope) = inbox.recv().await {
        envelope.ack(ack);
    }
}

#[tokio::test]
async fn test_send_to_unregistered_endpoint_is_permanent() {
    let bus = LocalBus::new();
    let err = bus
        .send(Endpoint::PageAgent, Endpoint::Coordinator, RelayMessage::Ping)
        .await
        .unwrap_err();
    assert!(err.is_permanent());
}

#[tokio::test]
async fn test_ping_roundtrip() {
    let bus = LocalBus::new();
    let inbox = bus.register(Endpoint::Coordinator, 8);
    task::spawn(answer_next(inbox, Ack::pong()));

    let ack = bus
        .send(Endpoint::PageAgent, Endpoint::Coordinator, RelayMessage::Ping)
        .await
        .unwrap();
    assert!(ack.is_pong());
}

#[tokio::test]
async fn test_fire_and_forget_returns_without_ack() {
    let bus = LocalBus::new();
    // Inbox kept alive but never read from within the send call
    let _inbox = bus.register(Endpoint::Panel, 8);

    let ack = bus
        .send(
            Endpoint::Coordinator,
            Endpoint::Panel,
            RelayMessage::SelectedText { text: "claim".to_string() },
        )
        .await
        .unwrap();
    assert_eq!(ack, Ack::none());
}

#[tokio::test]
async fn test_dropped_reply_is_transient() {
    let bus = LocalBus::new();
    let mut inbox = bus.register(Endpoint::Coordinator, 8);
    task::spawn(async move {
        if let Some(envelope) = inbox.recv().await {
            // Receiver processes the message but never acknowledges
            drop(envelope.reply);
        }
    });

    let err = bus
        .send(Endpoint::PageAgent, Endpoint::Coordinator, RelayMessage::Ping)
        .await
        .unwrap_err();
    assert!(matches!(err, DeliveryError::Transient(_)));
}

#[tokio::test]
async fn test_ack_timeout_is_transient() {
    let bus = LocalBus::with_ack_timeout(Duration::from_millis(20));
    // Registered but nobody ever reads the inbox
    let _inbox = bus.register(Endpoint::Coordinator, 8);

    let err = bus
        .send(Endpoint::PageAgent, Endpoint::Coordinator, RelayMessage::Ping)
        .await
        .unwrap_err();
    assert!(matches!(err, DeliveryError::Transient(_)));
    assert!(!err.is_permanent());
}

#[tokio::test]
async fn test_unregister_turns_sends_permanent() {
    let bus = LocalBus::new();
    let inbox = bus.register(Endpoint::Panel, 8);
    bus.unregister(Endpoint::Panel);
    drop(inbox);

    let err = bus
        .send(Endpoint::Coordinator, Endpoint::Panel, RelayMessage::GetSelectedText)
        .await
        .unwrap_err();
    assert!(err.is_permanent());
}

#[tokio::test]
async fn test_shutdown_fails_probe_and_sends() {
    let bus = LocalBus::new();
    let _inbox = bus.register(Endpoint::Coordinator, 8);
    assert!(bus.probe());

    bus.shutdown();
    assert!(!bus.probe());

    let err = bus
        .send(Endpoint::PageAgent, Endpoint::Coordinator, RelayMessage::Ping)
        .await
        .unwrap_err();
    assert!(err.is_permanent());
}

#[tokio::test]
async fn test_envelope_carries_sender_and_payload() {
    let bus = LocalBus::new();
    let mut inbox = bus.register(Endpoint::Coordinator, 8);

    let send = tokio::spawn(async move {
        let bus = bus;
        bus.send(
            Endpoint::PageAgent,
            Endpoint::Coordinator,
            RelayMessage::SelectedTextFromContent { text: "the claim".to_string() },
        )
        .await
    });

    let envelope = inbox.recv().await.unwrap();
    assert_eq!(envelope.from, Endpoint::PageAgent);
    assert_eq!(
        envelope.message,
        RelayMessage::SelectedTextFromContent { text: "the claim".to_string() }
    );
    envelope.ack(Ack::received());

    let ack = send.await.unwrap().unwrap();
    assert!(ack.is_received());
}

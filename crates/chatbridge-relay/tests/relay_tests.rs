// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end wiring of the relay handle over in-memory collaborators.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chatbridge_config::ChatBridgeConfig;
use chatbridge_core::types::LiveEvent;
use chatbridge_core::BridgeError;
use chatbridge_relay::contacts::StaticContacts;
use chatbridge_relay::{Collaborators, Relay};
use chatbridge_test_utils::{DeliveringSender, MockStore, RecordingNotifier};
use tokio_util::sync::CancellationToken;

fn collaborators(store: &MockStore, chat_id: i64, notifier: &RecordingNotifier) -> Collaborators {
    Collaborators {
        store: Arc::new(store.clone()),
        sender: Arc::new(DeliveringSender::new(store.clone(), chat_id)),
        notifier: Arc::new(notifier.clone()),
        contacts: Arc::new(StaticContacts::new(HashMap::new())),
    }
}

#[tokio::test]
async fn start_fails_on_empty_store() {
    let store = MockStore::new();
    let chat = store.add_chat(None, &["+15550001"]);
    let notifier = RecordingNotifier::new();
    let result = Relay::start(
        collaborators(&store, chat, &notifier),
        &ChatBridgeConfig::default(),
        CancellationToken::new(),
    )
    .await;
    assert!(matches!(result, Err(BridgeError::Watermark(_))));
}

#[tokio::test(start_paused = true)]
async fn relay_polls_and_sends_until_cancelled() {
    let store = MockStore::new();
    let chat = store.add_chat(None, &["+15550001"]);
    store.add_message(chat, Some("+15550001"), "hi", 100);
    let notifier = RecordingNotifier::new();
    let cancel = CancellationToken::new();

    let relay = Relay::start(
        collaborators(&store, chat, &notifier),
        &ChatBridgeConfig::default(),
        cancel.clone(),
    )
    .await
    .expect("relay starts");
    assert_eq!(relay.watermark(), 100);
    let mut events = relay.broadcaster().subscribe();

    let pending = relay.send_message("+15550001", "on my way ").unwrap();
    assert_eq!(relay.queue_depth(), 1);

    let sent = tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            let payload = events.recv().await.expect("subscription open");
            if let Ok(LiveEvent::MessageSent { send_id, message }) =
                serde_json::from_str::<LiveEvent>(&payload)
            {
                break (send_id, message);
            }
        }
    })
    .await
    .expect("send verified");
    assert_eq!(sent.0, pending.id);
    assert_eq!(sent.1.text, "on my way");
    assert_eq!(relay.queue_depth(), 0);

    // The delivered row is self-authored, so the poll loop advances past it
    // without notifying.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(relay.watermark() > 100);
    assert!(notifier.notifications().await.is_empty());

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), relay.wait())
        .await
        .expect("background tasks stop");
}

// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound senders for exercising the send queue.
//!
//! [`RecordingSender`] only captures dispatches. [`DeliveringSender`] also
//! writes the sent row into a [`MockStore`], the way the real client would,
//! and can be told to silently drop its first few dispatches.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use chatbridge_core::{AdapterType, BridgeError, OutboundSender, PluginAdapter};

use crate::mock_store::MockStore;

/// One captured dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendCall {
    pub body: String,
    pub recipients: String,
}

/// Captures every dispatch and never touches a store.
#[derive(Clone, Default)]
pub struct RecordingSender {
    calls: Arc<Mutex<Vec<SendCall>>>,
    failing: bool,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender that records the dispatch and then reports an error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub async fn calls(&self) -> Vec<SendCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for RecordingSender {
    fn name(&self) -> &str {
        "recording-sender"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Sender
    }
}

#[async_trait]
impl OutboundSender for RecordingSender {
    async fn send(&self, body: &str, recipients: &str) -> Result<(), BridgeError> {
        self.calls.lock().await.push(SendCall {
            body: body.to_string(),
            recipients: recipients.to_string(),
        });
        if self.failing {
            return Err(BridgeError::Send {
                message: "recording sender set to fail".into(),
            });
        }
        Ok(())
    }
}

/// Writes each dispatched body, with trailing whitespace trimmed, into a
/// chat of a [`MockStore`] as a self-authored row.
#[derive(Clone)]
pub struct DeliveringSender {
    store: MockStore,
    chat_id: i64,
    recorder: RecordingSender,
    drop_remaining: Arc<AtomicUsize>,
}

impl DeliveringSender {
    pub fn new(store: MockStore, chat_id: i64) -> Self {
        Self {
            store,
            chat_id,
            recorder: RecordingSender::new(),
            drop_remaining: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Silently lose the next `count` dispatches.
    pub fn dropping_first(self, count: usize) -> Self {
        self.drop_remaining.store(count, Ordering::SeqCst);
        self
    }

    pub async fn calls(&self) -> Vec<SendCall> {
        self.recorder.calls().await
    }
}

#[async_trait]
impl PluginAdapter for DeliveringSender {
    fn name(&self) -> &str {
        "delivering-sender"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Sender
    }
}

#[async_trait]
impl OutboundSender for DeliveringSender {
    async fn send(&self, body: &str, recipients: &str) -> Result<(), BridgeError> {
        self.recorder.send(body, recipients).await?;
        let dropped = self
            .drop_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !dropped {
            self.store.add_sent(self.chat_id, body.trim_end());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbridge_core::ChatStore;

    #[tokio::test]
    async fn delivering_sender_writes_trimmed_row() {
        let store = MockStore::new();
        let chat = store.add_chat(None, &["a@x.com"]);
        let sender = DeliveringSender::new(store.clone(), chat);

        sender.send("hello \n", "a@x.com").await.unwrap();
        let rows = store.recent_sent(5).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text.as_deref(), Some("hello"));
        assert_eq!(sender.calls().await[0].body, "hello \n");
    }

    #[tokio::test]
    async fn dropping_first_loses_dispatches() {
        let store = MockStore::new();
        let chat = store.add_chat(None, &["a@x.com"]);
        let sender = DeliveringSender::new(store.clone(), chat).dropping_first(2);

        for _ in 0..3 {
            sender.send("hi", "a@x.com").await.unwrap();
        }
        assert_eq!(store.recent_sent(5).await.unwrap().len(), 1);
        assert_eq!(sender.calls().await.len(), 3);
    }

    #[tokio::test]
    async fn failing_recording_sender_errors() {
        let sender = RecordingSender::failing();
        assert!(sender.send("x", "y").await.is_err());
        assert_eq!(sender.calls().await.len(), 1);
    }
}

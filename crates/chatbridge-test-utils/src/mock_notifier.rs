// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notifier that records every notification for assertion.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use chatbridge_core::{AdapterType, BridgeError, Notifier, PluginAdapter};

/// One captured notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub context: String,
}

/// Captures notifications; optionally fails every delivery after recording it.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    notify: Arc<Notify>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose deliveries are recorded but reported as failed.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    /// Wait until at least `count` notifications arrived, or `timeout` passes.
    ///
    /// Returns whatever was captured at that point.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<Notification> {
        let _ = tokio::time::timeout(timeout, async {
            loop {
                let notified = self.notify.notified();
                if self.sent.lock().await.len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await;
        self.notifications().await
    }
}

#[async_trait]
impl PluginAdapter for RecordingNotifier {
    fn name(&self) -> &str {
        "recording-notifier"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Notifier
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, title: &str, body: &str, context: &str) -> Result<(), BridgeError> {
        self.sent.lock().await.push(Notification {
            title: title.to_string(),
            body: body.to_string(),
            context: context.to_string(),
        });
        self.notify.notify_waiters();
        if self.failing {
            return Err(BridgeError::Notify {
                message: "recording notifier set to fail".into(),
                source: None,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_in_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify("Alice", "hi", "alice%40x.com").await.unwrap();
        notifier.notify("Bob", "yo", "bob").await.unwrap();
        let sent = notifier.notifications().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].title, "Alice");
        assert_eq!(sent[1].context, "bob");
    }

    #[tokio::test]
    async fn failing_still_records() {
        let notifier = RecordingNotifier::failing();
        assert!(notifier.notify("t", "b", "c").await.is_err());
        assert_eq!(notifier.notifications().await.len(), 1);
    }

    #[tokio::test]
    async fn wait_for_sees_spawned_notification() {
        let notifier = RecordingNotifier::new();
        let clone = notifier.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            clone.notify("t", "b", "c").await.unwrap();
        });
        let sent = notifier.wait_for(1, Duration::from_secs(2)).await;
        assert_eq!(sent.len(), 1);
    }
}

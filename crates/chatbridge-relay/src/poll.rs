// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Poll loop: detects new store rows past a watermark, notifies about
//! incoming messages, and pushes the refreshed conversation list to live
//! subscribers.
//!
//! The watermark is the timestamp of the last row seen. It is owned by the
//! loop and only ever moves forward; other tasks observe it through a
//! `watch` channel. Within a batch the watermark is advanced *before* a row
//! is processed, so a failure partway through a row never causes it to be
//! processed twice, at the cost of possibly missing that row's notification.

use std::sync::Arc;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use chatbridge_config::model::PollConfig;
use chatbridge_core::types::LiveEvent;
use chatbridge_core::{BridgeError, Notifier};

use crate::assembler::{message_view, Assembler};
use crate::broadcaster::Broadcaster;

/// Title used when a sender's handle cannot be resolved.
const UNKNOWN_SENDER: &str = "Unknown sender";

/// Characters left bare in a URL component: RFC 3986 unreserved.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode an identifier for use as notification callback context.
pub fn escape_context(identifier: &str) -> String {
    utf8_percent_encode(identifier, COMPONENT).to_string()
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Rows read past the previous watermark.
    pub processed: usize,
    /// Notifications dispatched for rows not authored locally.
    pub notified: usize,
    /// Subscribers that received the refreshed conversation list.
    pub delivered: usize,
}

/// The poll loop and its watermark.
pub struct PollLoop {
    assembler: Assembler,
    broadcaster: Broadcaster,
    notifier: Arc<dyn Notifier>,
    watermark: i64,
    watermark_tx: watch::Sender<i64>,
    batch_size: usize,
    interval: Duration,
}

impl PollLoop {
    /// Establish the starting watermark from the newest row in the store.
    ///
    /// Anything other than exactly one row (an empty store, or a store that
    /// cannot be read) is fatal: the loop is never created.
    pub async fn initialize(
        assembler: Assembler,
        broadcaster: Broadcaster,
        notifier: Arc<dyn Notifier>,
        config: &PollConfig,
    ) -> Result<Self, BridgeError> {
        let rows = assembler.reader().latest_timestamp().await;
        let watermark = match rows.as_slice() {
            [latest] => *latest,
            other => {
                return Err(BridgeError::Watermark(format!(
                    "expected exactly one row from the chat store, got {}",
                    other.len()
                )));
            }
        };
        let (watermark_tx, _) = watch::channel(watermark);
        info!(watermark, "poll watermark initialized");

        Ok(Self {
            assembler,
            broadcaster,
            notifier,
            watermark,
            watermark_tx,
            batch_size: config.batch_size,
            interval: Duration::from_millis(config.interval_ms),
        })
    }

    pub fn watermark(&self) -> i64 {
        self.watermark
    }

    /// Receiver tracking every watermark advance.
    pub fn watch_watermark(&self) -> watch::Receiver<i64> {
        self.watermark_tx.subscribe()
    }

    fn advance(&mut self, date: i64) {
        if date > self.watermark {
            self.watermark = date;
            self.watermark_tx.send_replace(date);
        }
    }

    /// Run one poll cycle.
    ///
    /// A failed query returns the error with the watermark untouched; the
    /// next tick retries from the same point.
    pub async fn tick(&mut self) -> Result<TickReport, BridgeError> {
        let reader = self.assembler.reader().clone();
        let rows = reader
            .try_messages_since(self.watermark, self.batch_size)
            .await?;
        if rows.is_empty() {
            return Ok(TickReport::default());
        }

        let contacts = self.assembler.contact_names().await;
        let handles = reader.handle_map().await;
        let mut report = TickReport {
            processed: rows.len(),
            ..TickReport::default()
        };

        for row in &rows {
            self.advance(row.date);
            if row.is_from_me {
                continue;
            }

            let view = message_view(row, &handles, &contacts);
            let identifier = view.sender.clone().unwrap_or_default();
            let title = view
                .sender_name
                .clone()
                .or_else(|| view.sender.clone())
                .unwrap_or_else(|| UNKNOWN_SENDER.to_string());
            let context = escape_context(&identifier);
            let notifier = self.notifier.clone();
            let message_id = row.id;
            tokio::spawn(async move {
                if let Err(e) = notifier.notify(&title, &view.text, &context).await {
                    warn!(message_id, error = %e, "notification failed");
                }
            });
            report.notified += 1;
        }

        let conversations = self.assembler.list_conversations().await;
        report.delivered = self
            .broadcaster
            .broadcast(&LiveEvent::Conversations { conversations })
            .await;
        debug!(
            processed = report.processed,
            notified = report.notified,
            watermark = self.watermark,
            "poll tick complete"
        );
        Ok(report)
    }

    /// Tick on a fixed interval until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        warn!(error = %e, watermark = self.watermark, "poll tick skipped");
                    }
                }
                _ = cancel.cancelled() => {
                    info!(watermark = self.watermark, "poll loop stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_percent_encoded() {
        assert_eq!(escape_context("+15550001"), "%2B15550001");
        assert_eq!(escape_context("a.b@example.com"), "a.b%40example.com");
        assert_eq!(escape_context("Team Chat"), "Team%20Chat");
        assert_eq!(escape_context("x~y_z-1"), "x~y_z-1");
        assert_eq!(escape_context(""), "");
    }
}

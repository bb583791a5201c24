// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound send queue with verification by re-reading the store.
//!
//! [`SendQueue`] is the cloneable enqueue handle; [`SendWorker`] owns the
//! FIFO and is the only task that touches it. The worker takes one item at
//! a time, so at most one send is in flight:
//!
//! 1. Dispatch through the [`OutboundSender`] without waiting on it.
//! 2. Every `verify_interval`, up to `verify_attempts` times, look among the
//!    most recent self-authored, error-free rows for one whose text equals
//!    the body with trailing whitespace trimmed.
//! 3. On a match, broadcast the confirmed row. Otherwise bump the attempt
//!    counter and either re-queue at the tail or, at `max_attempts`, give
//!    up and report the failure.
//!
//! Matching is by text alone, so any recent sent row with the same body
//! confirms a send, including one sent earlier. A client that rewrites
//! text will never confirm.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use chatbridge_config::model::SendConfig;
use chatbridge_core::types::{LiveEvent, MessageRow, PendingSend, SendState};
use chatbridge_core::{BridgeError, Notifier, OutboundSender};

use crate::assembler::Assembler;
use crate::broadcaster::Broadcaster;
use crate::poll::escape_context;

/// Rows fetched per verification check.
const VERIFY_SCAN_LIMIT: usize = 25;

/// Notification title for a send that exhausted its attempts.
const SEND_FAILED_TITLE: &str = "Message failed to send";

/// Cloneable handle for enqueuing outbound messages.
#[derive(Clone)]
pub struct SendQueue {
    tx: mpsc::UnboundedSender<PendingSend>,
    depth: Arc<AtomicUsize>,
}

impl SendQueue {
    /// Queue a message and return immediately.
    ///
    /// The returned snapshot carries the id that later `message_sent` or
    /// `send_failed` events refer to. Fails only if the worker has stopped.
    pub fn enqueue(
        &self,
        recipients: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<PendingSend, BridgeError> {
        let send = PendingSend::new(recipients, body);
        self.depth.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(send.clone()).is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(BridgeError::Send {
                message: "send queue is closed".into(),
            });
        }
        debug!(send_id = %send.id, "send enqueued");
        Ok(send)
    }

    /// Sends queued, in flight, or awaiting retry.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

/// Final result of one dispatch-and-verify cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Verified(MessageRow),
    Failed,
    Retrying,
}

/// Owns the queue and processes it one item at a time.
pub struct SendWorker {
    rx: mpsc::UnboundedReceiver<PendingSend>,
    pending: VecDeque<PendingSend>,
    depth: Arc<AtomicUsize>,
    assembler: Assembler,
    broadcaster: Broadcaster,
    sender: Arc<dyn OutboundSender>,
    notifier: Arc<dyn Notifier>,
    verify_interval: Duration,
    verify_attempts: u32,
    max_attempts: u32,
}

/// Create a connected queue handle and worker.
pub fn channel(
    assembler: Assembler,
    broadcaster: Broadcaster,
    sender: Arc<dyn OutboundSender>,
    notifier: Arc<dyn Notifier>,
    config: &SendConfig,
) -> (SendQueue, SendWorker) {
    let (tx, rx) = mpsc::unbounded_channel();
    let depth = Arc::new(AtomicUsize::new(0));
    let queue = SendQueue {
        tx,
        depth: depth.clone(),
    };
    let worker = SendWorker {
        rx,
        pending: VecDeque::new(),
        depth,
        assembler,
        broadcaster,
        sender,
        notifier,
        verify_interval: Duration::from_millis(config.verify_interval_ms),
        verify_attempts: config.verify_attempts,
        max_attempts: config.max_attempts,
    };
    (queue, worker)
}

impl SendWorker {
    /// Process sends until `cancel` fires or every queue handle is dropped
    /// and the queue is empty.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            let next = match self.pending.pop_front() {
                Some(send) => send,
                None => tokio::select! {
                    received = self.rx.recv() => match received {
                        Some(send) => send,
                        None => break,
                    },
                    _ = cancel.cancelled() => break,
                },
            };

            tokio::select! {
                _ = self.process(next) => {}
                _ = cancel.cancelled() => break,
            }
        }
        info!(remaining = self.depth.load(Ordering::SeqCst), "send worker stopping");
    }

    /// Move everything waiting in the channel onto the local queue.
    fn drain_channel(&mut self) {
        while let Ok(send) = self.rx.try_recv() {
            self.pending.push_back(send);
        }
    }

    /// Run one full cycle for the item at the head of the queue.
    pub async fn process(&mut self, mut send: PendingSend) -> CycleOutcome {
        send.state = SendState::InFlight;
        debug!(send_id = %send.id, attempt = send.attempts + 1, "dispatching send");

        let sender = self.sender.clone();
        let (body, recipients, send_id) = (send.body.clone(), send.recipients.clone(), send.id);
        tokio::spawn(async move {
            if let Err(e) = sender.send(&body, &recipients).await {
                warn!(send_id = %send_id, error = %e, "sender reported an error");
            }
        });

        let confirmed = self.verify(send.normalized_body()).await;
        let state = send.record_cycle(confirmed.is_some(), self.max_attempts);
        match (state, confirmed) {
            (SendState::Verified, Some(row)) => {
                self.depth.fetch_sub(1, Ordering::SeqCst);
                info!(send_id = %send.id, message_id = row.id, "send verified");
                if let Some(message) = self
                    .assembler
                    .views(std::slice::from_ref(&row))
                    .await
                    .into_iter()
                    .next()
                {
                    self.broadcaster
                        .broadcast(&LiveEvent::MessageSent {
                            send_id: send.id,
                            message,
                        })
                        .await;
                }
                CycleOutcome::Verified(row)
            }
            (SendState::Failed, _) => {
                self.depth.fetch_sub(1, Ordering::SeqCst);
                warn!(send_id = %send.id, attempts = send.attempts, "send failed");
                self.report_failure(&send).await;
                CycleOutcome::Failed
            }
            _ => {
                info!(send_id = %send.id, attempts = send.attempts, "send unconfirmed, re-queuing");
                self.drain_channel();
                self.pending.push_back(send);
                CycleOutcome::Retrying
            }
        }
    }

    /// Poll the store for a row confirming `expected`.
    async fn verify(&self, expected: &str) -> Option<MessageRow> {
        let reader = self.assembler.reader();
        for _ in 0..self.verify_attempts {
            tokio::time::sleep(self.verify_interval).await;
            let found = reader
                .recent_sent(VERIFY_SCAN_LIMIT)
                .await
                .into_iter()
                .find(|row| row.text.as_deref().map(str::trim_end) == Some(expected));
            if found.is_some() {
                return found;
            }
        }
        None
    }

    async fn report_failure(&self, send: &PendingSend) {
        let notifier = self.notifier.clone();
        let (body, context, send_id) = (
            send.body.clone(),
            escape_context(&send.recipients),
            send.id,
        );
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(SEND_FAILED_TITLE, &body, &context).await {
                warn!(send_id = %send_id, error = %e, "failure notification failed");
            }
        });

        self.broadcaster
            .broadcast(&LiveEvent::SendFailed {
                send_id: send.id,
                text: send.body.clone(),
                recipients: send.recipients.clone(),
                attempts: send.attempts,
            })
            .await;
    }

    /// Sends waiting locally for a retry slot.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

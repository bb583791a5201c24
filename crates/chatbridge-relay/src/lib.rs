// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The relay core: reads the chat store, watches it for new rows, sends
//! through an unreliable external sender with verification, and fans live
//! updates out to subscribers.
//!
//! [`Relay::start`] wires the pieces together and spawns the two background
//! tasks, the [`PollLoop`] and the [`SendWorker`]. Everything else in the
//! process talks to the relay through the cloneable [`Relay`] handle.

pub mod assembler;
pub mod broadcaster;
pub mod contacts;
pub mod notify;
pub mod poll;
pub mod reader;
pub mod send_queue;
pub mod sender;

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use chatbridge_config::ChatBridgeConfig;
use chatbridge_core::types::PendingSend;
use chatbridge_core::{BridgeError, ChatStore, ContactDirectory, Notifier, OutboundSender};

pub use assembler::Assembler;
pub use broadcaster::{Broadcaster, Subscription};
pub use poll::PollLoop;
pub use reader::StoreReader;
pub use send_queue::{SendQueue, SendWorker};

/// External collaborators the relay is built from.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn ChatStore>,
    pub sender: Arc<dyn OutboundSender>,
    pub notifier: Arc<dyn Notifier>,
    pub contacts: Arc<dyn ContactDirectory>,
}

/// Handle to a running relay.
#[derive(Clone)]
pub struct Relay {
    assembler: Assembler,
    broadcaster: Broadcaster,
    queue: SendQueue,
    watermark: watch::Receiver<i64>,
    tasks: TaskTracker,
}

impl Relay {
    /// Initialize the watermark and spawn the poll loop and send worker.
    ///
    /// Fails without spawning anything if the watermark cannot be
    /// established.
    pub async fn start(
        collaborators: Collaborators,
        config: &ChatBridgeConfig,
        cancel: CancellationToken,
    ) -> Result<Self, BridgeError> {
        let reader = StoreReader::new(collaborators.store);
        let assembler = Assembler::new(reader, collaborators.contacts);
        let broadcaster = Broadcaster::new(&config.broadcast);

        let poll = PollLoop::initialize(
            assembler.clone(),
            broadcaster.clone(),
            collaborators.notifier.clone(),
            &config.poll,
        )
        .await?;
        let watermark = poll.watch_watermark();

        let (queue, worker) = send_queue::channel(
            assembler.clone(),
            broadcaster.clone(),
            collaborators.sender,
            collaborators.notifier,
            &config.send,
        );

        let tasks = TaskTracker::new();
        tasks.spawn(poll.run(cancel.clone()));
        tasks.spawn(worker.run(cancel));
        tasks.close();

        Ok(Self {
            assembler,
            broadcaster,
            queue,
            watermark,
            tasks,
        })
    }

    pub fn assembler(&self) -> &Assembler {
        &self.assembler
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Queue an outbound message. Returns before any dispatch happens.
    pub fn send_message(&self, recipients: &str, body: &str) -> Result<PendingSend, BridgeError> {
        self.queue.enqueue(recipients, body)
    }

    /// Current poll watermark.
    pub fn watermark(&self) -> i64 {
        *self.watermark.borrow()
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    /// Wait for the background tasks to finish after cancellation.
    pub async fn wait(&self) {
        self.tasks.wait().await;
    }
}

// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for ChatBridge collaborators.
//!
//! Provides mock adapters for fast, deterministic tests with no chat
//! database, no external sender, and no network.
//!
//! # Components
//!
//! - [`MockStore`] - In-memory chat store with injectable rows and failures
//! - [`RecordingNotifier`] - Captures notifications
//! - [`RecordingSender`] / [`DeliveringSender`] - Capture dispatches; the latter
//!   also writes the sent row back into a `MockStore`

pub mod mock_notifier;
pub mod mock_sender;
pub mod mock_store;

pub use mock_notifier::{Notification, RecordingNotifier};
pub use mock_sender::{DeliveringSender, RecordingSender, SendCall};
pub use mock_store::MockStore;

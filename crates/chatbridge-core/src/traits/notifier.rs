// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound notification collaborator (push, webhook, log).

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::traits::adapter::PluginAdapter;

/// Delivers a user-facing notification.
///
/// Callers treat delivery as fire-and-forget: errors are logged and dropped.
#[async_trait]
pub trait Notifier: PluginAdapter {
    /// Send a notification. `context` is an opaque callback value
    /// (the URL-escaped sender identifier for inbound messages).
    async fn notify(&self, title: &str, body: &str, context: &str) -> Result<(), BridgeError>;
}

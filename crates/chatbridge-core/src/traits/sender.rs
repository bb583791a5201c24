// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The external mechanism that injects an outbound message into the client.

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::traits::adapter::PluginAdapter;

/// Hands an outbound message to the messaging client.
///
/// Success of `send` only means the side effect was triggered. Whether the
/// message was actually sent is learned later by re-reading the store.
#[async_trait]
pub trait OutboundSender: PluginAdapter {
    async fn send(&self, body: &str, recipients: &str) -> Result<(), BridgeError>;
}

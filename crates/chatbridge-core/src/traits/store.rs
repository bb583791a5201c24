// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only access to the messaging client's chat database.

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AttachmentMeta, HandleRow, MembershipRow, MessageRow};

/// Read-only queries against the message/conversation/attachment store.
///
/// Implementations never write. Errors are returned as-is; callers that
/// favor availability wrap them (see the relay's `StoreReader`).
#[async_trait]
pub trait ChatStore: PluginAdapter {
    /// The most recent `limit` messages of a chat, newest first.
    async fn recent_messages(
        &self,
        chat_id: i64,
        limit: usize,
    ) -> Result<Vec<MessageRow>, BridgeError>;

    /// All handle -> identifier rows.
    async fn handles(&self) -> Result<Vec<HandleRow>, BridgeError>;

    /// All chat-membership join rows, ordered by chat then join order.
    async fn memberships(&self) -> Result<Vec<MembershipRow>, BridgeError>;

    /// Attachment metadata by id.
    async fn attachment(&self, attachment_id: i64)
    -> Result<Option<AttachmentMeta>, BridgeError>;

    /// Timestamps of the newest message, one row per message found.
    ///
    /// Returns at most one element; an empty store returns none.
    async fn latest_timestamp(&self) -> Result<Vec<i64>, BridgeError>;

    /// Messages strictly newer than `watermark`, oldest first, capped at `limit`.
    async fn messages_since(
        &self,
        watermark: i64,
        limit: usize,
    ) -> Result<Vec<MessageRow>, BridgeError>;

    /// The most recent self-authored, error-free messages, newest first,
    /// capped at `limit`.
    async fn recent_sent(&self, limit: usize) -> Result<Vec<MessageRow>, BridgeError>;
}

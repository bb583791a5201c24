// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fail-soft facade over a [`ChatStore`].
//!
//! Every read logs and swallows store errors, returning an empty result.
//! The poll loop is the one caller that needs to tell "nothing new" from
//! "query failed", so [`StoreReader::try_messages_since`] keeps the error.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use chatbridge_core::types::{AttachmentMeta, HandleRow, MembershipRow, MessageRow};
use chatbridge_core::{BridgeError, ChatStore};

/// Read-only, fail-soft access to the chat store.
#[derive(Clone)]
pub struct StoreReader {
    store: Arc<dyn ChatStore>,
}

impl StoreReader {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    /// The wrapped store.
    pub fn store(&self) -> &Arc<dyn ChatStore> {
        &self.store
    }

    /// Most recent `limit` messages of `chat_id`, newest first.
    pub async fn recent_messages(&self, chat_id: i64, limit: usize) -> Vec<MessageRow> {
        self.store
            .recent_messages(chat_id, limit)
            .await
            .unwrap_or_else(|e| {
                warn!(chat_id, error = %e, "message query failed");
                Vec::new()
            })
    }

    pub async fn handles(&self) -> Vec<HandleRow> {
        self.store.handles().await.unwrap_or_else(|e| {
            warn!(error = %e, "handle query failed");
            Vec::new()
        })
    }

    /// Handle id -> identifier lookup table.
    pub async fn handle_map(&self) -> HashMap<i64, String> {
        self.handles()
            .await
            .into_iter()
            .map(|h| (h.id, h.identifier))
            .collect()
    }

    pub async fn memberships(&self) -> Vec<MembershipRow> {
        self.store.memberships().await.unwrap_or_else(|e| {
            warn!(error = %e, "membership query failed");
            Vec::new()
        })
    }

    pub async fn attachment(&self, id: i64) -> Option<AttachmentMeta> {
        self.store.attachment(id).await.unwrap_or_else(|e| {
            warn!(attachment_id = id, error = %e, "attachment query failed");
            None
        })
    }

    pub async fn latest_timestamp(&self) -> Vec<i64> {
        self.store.latest_timestamp().await.unwrap_or_else(|e| {
            warn!(error = %e, "latest timestamp query failed");
            Vec::new()
        })
    }

    /// The most recent self-authored, error-free rows, newest first.
    pub async fn recent_sent(&self, limit: usize) -> Vec<MessageRow> {
        self.store.recent_sent(limit).await.unwrap_or_else(|e| {
            warn!(error = %e, "sent message query failed");
            Vec::new()
        })
    }

    /// Rows newer than `watermark`, oldest first. Errors are returned.
    pub async fn try_messages_since(
        &self,
        watermark: i64,
        limit: usize,
    ) -> Result<Vec<MessageRow>, BridgeError> {
        self.store.messages_since(watermark, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbridge_test_utils::MockStore;

    #[tokio::test]
    async fn failures_become_empty_results() {
        let store = MockStore::new();
        let chat = store.add_chat(None, &["+1555"]);
        store.add_message(chat, Some("+1555"), "hi", 1);
        store.set_failing(true);

        let reader = StoreReader::new(Arc::new(store.clone()));
        assert!(reader.recent_messages(chat, 5).await.is_empty());
        assert!(reader.handles().await.is_empty());
        assert!(reader.memberships().await.is_empty());
        assert!(reader.attachment(1).await.is_none());
        assert!(reader.latest_timestamp().await.is_empty());
        assert!(reader.recent_sent(5).await.is_empty());
        assert!(reader.try_messages_since(0, 5).await.is_err());
    }

    #[tokio::test]
    async fn handle_map_indexes_by_id() {
        let store = MockStore::new();
        let a = store.add_handle("a@x.com");
        let b = store.add_handle("+1555");
        let reader = StoreReader::new(Arc::new(store));
        let map = reader.handle_map().await;
        assert_eq!(map.get(&a).map(String::as_str), Some("a@x.com"));
        assert_eq!(map.get(&b).map(String::as_str), Some("+1555"));
    }
}

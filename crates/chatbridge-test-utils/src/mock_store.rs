// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory chat store for deterministic tests.
//!
//! `MockStore` implements [`ChatStore`] over plain vectors. Rows can be added
//! at any time, including from a running sender, and the whole store can be
//! switched into a failing mode to exercise fail-soft paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use chatbridge_core::types::{AttachmentMeta, HandleRow, MembershipRow, MessageRow};
use chatbridge_core::{AdapterType, BridgeError, ChatStore, PluginAdapter};

#[derive(Default)]
struct Chat {
    id: i64,
    guid: String,
    display_name: Option<String>,
    participants: Vec<String>,
}

#[derive(Default)]
struct State {
    handles: Vec<HandleRow>,
    chats: Vec<Chat>,
    messages: Vec<MessageRow>,
    attachments: Vec<AttachmentMeta>,
    failing: bool,
}

/// A cloneable, shared in-memory store.
#[derive(Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<State>>,
    recent_sent_calls: Arc<AtomicUsize>,
    since_calls: Arc<AtomicUsize>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every query fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.state().failing = failing;
    }

    /// Register a handle, returning its id. Repeated identifiers share an id.
    pub fn add_handle(&self, identifier: &str) -> i64 {
        let mut state = self.state();
        if let Some(existing) = state.handles.iter().find(|h| h.identifier == identifier) {
            return existing.id;
        }
        let id = state.handles.len() as i64 + 1;
        state.handles.push(HandleRow {
            id,
            identifier: identifier.to_string(),
        });
        id
    }

    /// Create a chat with the given participants in join order.
    pub fn add_chat(&self, display_name: Option<&str>, participants: &[&str]) -> i64 {
        for participant in participants {
            self.add_handle(participant);
        }
        let mut state = self.state();
        let id = state.chats.len() as i64 + 1;
        state.chats.push(Chat {
            id,
            guid: format!("chat-{id}"),
            display_name: display_name.map(str::to_string),
            participants: participants.iter().map(|p| p.to_string()).collect(),
        });
        id
    }

    /// Add a message. `sender` of `None` marks it self-authored.
    pub fn add_message(&self, chat_id: i64, sender: Option<&str>, text: &str, date: i64) -> i64 {
        let handle_id = sender.map(|s| self.add_handle(s));
        let mut state = self.state();
        let id = state.messages.len() as i64 + 1;
        state.messages.push(MessageRow {
            id,
            guid: format!("msg-{id}"),
            chat_id,
            handle_id,
            text: Some(text.to_string()),
            date,
            date_delivered: None,
            date_read: None,
            error: 0,
            is_from_me: sender.is_none(),
            attachment_id: None,
            attachment_mime_type: None,
            attachment_transfer_name: None,
        });
        id
    }

    /// Add a self-authored message dated after everything in the store.
    pub fn add_sent(&self, chat_id: i64, text: &str) -> i64 {
        let date = self.latest_date() + 1;
        self.add_message(chat_id, None, text, date)
    }

    /// Insert a fully specified row. Its id and guid are kept as given.
    pub fn push_row(&self, row: MessageRow) {
        self.state().messages.push(row);
    }

    /// Attach a file to an existing message.
    pub fn add_attachment(&self, message_id: i64, filename: &str, mime_type: &str) -> i64 {
        let mut state = self.state();
        let id = state.attachments.len() as i64 + 1;
        let transfer_name = filename.rsplit('/').next().unwrap_or(filename).to_string();
        state.attachments.push(AttachmentMeta {
            id,
            guid: format!("att-{id}"),
            message_id: Some(message_id),
            filename: Some(filename.to_string()),
            mime_type: Some(mime_type.to_string()),
            transfer_name: Some(transfer_name.clone()),
        });
        if let Some(row) = state.messages.iter_mut().find(|m| m.id == message_id) {
            row.attachment_id = Some(id);
            row.attachment_mime_type = Some(mime_type.to_string());
            row.attachment_transfer_name = Some(transfer_name);
        }
        id
    }

    /// Newest message date, or 0 when empty.
    pub fn latest_date(&self) -> i64 {
        self.state().messages.iter().map(|m| m.date).max().unwrap_or(0)
    }

    /// Number of `recent_sent` queries served so far.
    pub fn recent_sent_calls(&self) -> usize {
        self.recent_sent_calls.load(Ordering::SeqCst)
    }

    /// Number of `messages_since` queries served so far.
    pub fn since_calls(&self) -> usize {
        self.since_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<MutexGuard<'_, State>, BridgeError> {
        let state = self.state();
        if state.failing {
            return Err(BridgeError::storage(std::io::Error::other(
                "mock store is failing",
            )));
        }
        Ok(state)
    }
}

#[async_trait]
impl PluginAdapter for MockStore {
    fn name(&self) -> &str {
        "mock-store"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }
}

#[async_trait]
impl ChatStore for MockStore {
    async fn recent_messages(
        &self,
        chat_id: i64,
        limit: usize,
    ) -> Result<Vec<MessageRow>, BridgeError> {
        let state = self.check()?;
        let mut rows: Vec<MessageRow> = state
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn handles(&self) -> Result<Vec<HandleRow>, BridgeError> {
        Ok(self.check()?.handles.clone())
    }

    async fn memberships(&self) -> Result<Vec<MembershipRow>, BridgeError> {
        let state = self.check()?;
        Ok(state
            .chats
            .iter()
            .flat_map(|chat| {
                chat.participants.iter().map(move |participant| MembershipRow {
                    chat_id: chat.id,
                    chat_guid: chat.guid.clone(),
                    chat_identifier: chat.participants.first().cloned(),
                    display_name: chat.display_name.clone(),
                    participant: participant.clone(),
                })
            })
            .collect())
    }

    async fn attachment(
        &self,
        attachment_id: i64,
    ) -> Result<Option<AttachmentMeta>, BridgeError> {
        let state = self.check()?;
        Ok(state
            .attachments
            .iter()
            .find(|a| a.id == attachment_id)
            .cloned())
    }

    async fn latest_timestamp(&self) -> Result<Vec<i64>, BridgeError> {
        let state = self.check()?;
        Ok(state.messages.iter().map(|m| m.date).max().into_iter().collect())
    }

    async fn messages_since(
        &self,
        watermark: i64,
        limit: usize,
    ) -> Result<Vec<MessageRow>, BridgeError> {
        self.since_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.check()?;
        let mut rows: Vec<MessageRow> = state
            .messages
            .iter()
            .filter(|m| m.date > watermark)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn recent_sent(&self, limit: usize) -> Result<Vec<MessageRow>, BridgeError> {
        self.recent_sent_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.check()?;
        let mut rows: Vec<MessageRow> = state
            .messages
            .iter()
            .filter(|m| m.is_from_me && m.error == 0)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        rows.truncate(limit);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memberships_expand_participants_in_order() {
        let store = MockStore::new();
        let group = store.add_chat(Some("Team"), &["a@x.com", "+1555"]);
        store.add_chat(None, &["+1555"]);

        let rows = store.memberships().await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].chat_id, group);
        assert_eq!(rows[0].participant, "a@x.com");
        assert_eq!(rows[1].participant, "+1555");
        assert_eq!(store.handles().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn queries_respect_order_and_filters() {
        let store = MockStore::new();
        let chat = store.add_chat(None, &["+1555"]);
        store.add_message(chat, Some("+1555"), "in", 10);
        store.add_message(chat, None, "out", 20);

        let recent = store.recent_messages(chat, 10).await.unwrap();
        assert_eq!(recent[0].text.as_deref(), Some("out"));

        let since = store.messages_since(10, 10).await.unwrap();
        assert_eq!(since.len(), 1);
        assert_eq!(store.since_calls(), 1);

        let sent = store.recent_sent(10).await.unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].is_from_me);
        assert_eq!(store.latest_timestamp().await.unwrap(), vec![20]);
    }

    #[tokio::test]
    async fn failing_mode_errors_every_query() {
        let store = MockStore::new();
        store.set_failing(true);
        assert!(store.handles().await.is_err());
        assert!(store.latest_timestamp().await.is_err());
        store.set_failing(false);
        assert!(store.latest_timestamp().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn attachments_link_back_to_message() {
        let store = MockStore::new();
        let chat = store.add_chat(None, &["+1555"]);
        let msg = store.add_message(chat, Some("+1555"), "\u{FFFC}", 5);
        let att = store.add_attachment(msg, "~/Attachments/IMG_2.png", "image/png");

        let row = &store.recent_messages(chat, 1).await.unwrap()[0];
        assert_eq!(row.attachment_id, Some(att));
        let meta = store.attachment(att).await.unwrap().unwrap();
        assert_eq!(meta.transfer_name.as_deref(), Some("IMG_2.png"));
    }
}

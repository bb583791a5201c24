// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds client-facing conversation and message views from raw store rows.
//!
//! Nothing here is cached: every call re-reads the store and re-derives
//! display names, so contact table changes show up on the next request.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use chatbridge_core::types::{
    apple_timestamp_to_utc, AttachmentMeta, AttachmentRef, ConversationView, MembershipRow,
    MessageRow, MessageView,
};
use chatbridge_core::ContactDirectory;

use crate::reader::StoreReader;

/// The object replacement character the client stores where an attachment
/// sits inline in the text.
pub const ATTACHMENT_PLACEHOLDER: char = '\u{FFFC}';

/// Human name for `identifier`, falling back to the identifier itself.
fn resolve_name<'a>(identifier: &'a str, contacts: &'a HashMap<String, String>) -> &'a str {
    contacts
        .get(identifier)
        .map(String::as_str)
        .unwrap_or(identifier)
}

/// Build the view of a single message row.
pub fn message_view(
    row: &MessageRow,
    handles: &HashMap<i64, String>,
    contacts: &HashMap<String, String>,
) -> MessageView {
    let sender = if row.is_from_me {
        None
    } else {
        row.handle_id.and_then(|id| handles.get(&id).cloned())
    };
    let sender_name = sender
        .as_ref()
        .and_then(|identifier| contacts.get(identifier).cloned());
    let attachment = row.attachment_id.map(|id| AttachmentRef {
        id,
        mime_type: row.attachment_mime_type.clone(),
        transfer_name: row.attachment_transfer_name.clone(),
    });

    MessageView {
        id: row.id,
        guid: row.guid.clone(),
        chat_id: row.chat_id,
        text: row
            .text
            .as_deref()
            .unwrap_or_default()
            .replace(ATTACHMENT_PLACEHOLDER, ""),
        date: row.date,
        sent_at: apple_timestamp_to_utc(row.date).map(|t| t.to_rfc3339()),
        date_delivered: row.date_delivered,
        date_read: row.date_read,
        error: row.error,
        is_from_me: row.is_from_me,
        sender,
        sender_name,
        has_attachment: attachment.is_some(),
        attachment,
    }
}

/// Fold flat membership rows into one conversation per chat id.
///
/// The first row for a chat seeds it. Each later row appends its participant
/// to `ids`, and to the display name when that name was synthesized. A
/// non-empty store name is used verbatim and never extended. Output keeps
/// the order in which chat ids first appear.
pub fn fold_conversations(
    rows: &[MembershipRow],
    contacts: &HashMap<String, String>,
) -> Vec<ConversationView> {
    let mut conversations: Vec<ConversationView> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        let name = resolve_name(&row.participant, contacts);
        match index.get(&row.chat_id) {
            Some(&i) => {
                let conversation = &mut conversations[i];
                conversation.ids.push(',');
                conversation.ids.push_str(&row.participant);
                if conversation.has_manual_display_name {
                    conversation.display_name.push_str(", ");
                    conversation.display_name.push_str(name);
                }
            }
            None => {
                let store_name = row
                    .display_name
                    .as_deref()
                    .filter(|n| !n.is_empty());
                index.insert(row.chat_id, conversations.len());
                conversations.push(ConversationView {
                    chat_id: row.chat_id,
                    guid: row.chat_guid.clone(),
                    chat_identifier: row.chat_identifier.clone(),
                    display_name: store_name.unwrap_or(name).to_string(),
                    has_manual_display_name: store_name.is_none(),
                    ids: row.participant.clone(),
                    last_message: None,
                });
            }
        }
    }

    conversations
}

/// Assembles views on demand from a [`StoreReader`] and a contact directory.
#[derive(Clone)]
pub struct Assembler {
    reader: StoreReader,
    contacts: Arc<dyn ContactDirectory>,
}

impl Assembler {
    pub fn new(reader: StoreReader, contacts: Arc<dyn ContactDirectory>) -> Self {
        Self { reader, contacts }
    }

    pub fn reader(&self) -> &StoreReader {
        &self.reader
    }

    /// Current identifier -> name table.
    pub async fn contact_names(&self) -> HashMap<String, String> {
        self.contacts.names().await
    }

    /// All conversations with their latest message, most recently active first.
    ///
    /// Conversations without any message sort last, in store order.
    pub async fn list_conversations(&self) -> Vec<ConversationView> {
        let contacts = self.contacts.names().await;
        let handles = self.reader.handle_map().await;
        let memberships = self.reader.memberships().await;

        let mut conversations = fold_conversations(&memberships, &contacts);
        for conversation in &mut conversations {
            conversation.last_message = self
                .reader
                .recent_messages(conversation.chat_id, 1)
                .await
                .first()
                .map(|row| message_view(row, &handles, &contacts));
        }
        conversations.sort_by_key(|c| Reverse(c.last_message.as_ref().map(|m| m.date)));
        conversations
    }

    /// The `limit` most recent messages of a chat, newest first.
    pub async fn list_messages(&self, chat_id: i64, limit: usize) -> Vec<MessageView> {
        let rows = self.reader.recent_messages(chat_id, limit).await;
        self.views(&rows).await
    }

    /// Views for arbitrary rows, resolving senders against current tables.
    pub async fn views(&self, rows: &[MessageRow]) -> Vec<MessageView> {
        if rows.is_empty() {
            return Vec::new();
        }
        let contacts = self.contacts.names().await;
        let handles = self.reader.handle_map().await;
        rows.iter()
            .map(|row| message_view(row, &handles, &contacts))
            .collect()
    }

    pub async fn get_attachment(&self, id: i64) -> Option<AttachmentMeta> {
        self.reader.attachment(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::StaticContacts;
    use chatbridge_test_utils::MockStore;

    fn membership(chat_id: i64, name: Option<&str>, participant: &str) -> MembershipRow {
        MembershipRow {
            chat_id,
            chat_guid: format!("chat-{chat_id}"),
            chat_identifier: None,
            display_name: name.map(str::to_string),
            participant: participant.to_string(),
        }
    }

    fn contacts() -> HashMap<String, String> {
        HashMap::from([
            ("+15550001".to_string(), "Alice".to_string()),
            ("bob@example.com".to_string(), "Bob".to_string()),
        ])
    }

    #[test]
    fn synthesized_names_accumulate() {
        let rows = vec![
            membership(1, None, "+15550001"),
            membership(1, Some(""), "bob@example.com"),
            membership(1, None, "+15559999"),
        ];
        let convs = fold_conversations(&rows, &contacts());
        assert_eq!(convs.len(), 1);
        assert_eq!(convs[0].display_name, "Alice, Bob, +15559999");
        assert!(convs[0].has_manual_display_name);
        assert_eq!(convs[0].ids, "+15550001,bob@example.com,+15559999");
    }

    #[test]
    fn store_name_is_used_verbatim() {
        let rows = vec![
            membership(7, Some("Book Club"), "+15550001"),
            membership(7, Some("Book Club"), "bob@example.com"),
        ];
        let convs = fold_conversations(&rows, &contacts());
        assert_eq!(convs[0].display_name, "Book Club");
        assert!(!convs[0].has_manual_display_name);
        assert_eq!(convs[0].ids, "+15550001,bob@example.com");
    }

    #[test]
    fn fold_keeps_first_appearance_order() {
        let rows = vec![
            membership(3, None, "a"),
            membership(1, None, "b"),
            membership(3, None, "c"),
        ];
        let ids: Vec<i64> = fold_conversations(&rows, &HashMap::new())
            .iter()
            .map(|c| c.chat_id)
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn message_view_resolves_sender_and_strips_placeholder() {
        let row = MessageRow {
            id: 10,
            guid: "g".into(),
            chat_id: 1,
            handle_id: Some(4),
            text: Some("look \u{FFFC}".into()),
            date: 700_000_000,
            date_delivered: None,
            date_read: None,
            error: 0,
            is_from_me: false,
            attachment_id: Some(2),
            attachment_mime_type: Some("image/png".into()),
            attachment_transfer_name: Some("a.png".into()),
        };
        let handles = HashMap::from([(4, "+15550001".to_string())]);
        let view = message_view(&row, &handles, &contacts());
        assert_eq!(view.text, "look ");
        assert_eq!(view.sender.as_deref(), Some("+15550001"));
        assert_eq!(view.sender_name.as_deref(), Some("Alice"));
        assert!(view.has_attachment);
        assert_eq!(view.attachment.unwrap().id, 2);
        assert!(view.sent_at.unwrap().starts_with("2023-"));
    }

    #[test]
    fn self_authored_message_has_no_sender() {
        let row = MessageRow {
            id: 1,
            guid: "g".into(),
            chat_id: 1,
            handle_id: None,
            text: None,
            date: 0,
            date_delivered: None,
            date_read: None,
            error: 0,
            is_from_me: true,
            attachment_id: None,
            attachment_mime_type: None,
            attachment_transfer_name: None,
        };
        let view = message_view(&row, &HashMap::new(), &HashMap::new());
        assert!(view.sender.is_none());
        assert_eq!(view.text, "");
        assert!(view.sent_at.is_none());
        assert!(!view.has_attachment);
    }

    #[tokio::test]
    async fn conversations_sorted_by_latest_message() {
        let store = MockStore::new();
        let quiet = store.add_chat(None, &["+15550001"]);
        let busy = store.add_chat(Some("Team"), &["bob@example.com", "+15550001"]);
        let empty = store.add_chat(None, &["+15557777"]);
        store.add_message(quiet, Some("+15550001"), "old", 100);
        store.add_message(busy, Some("bob@example.com"), "new", 200);

        let assembler = Assembler::new(
            StoreReader::new(Arc::new(store)),
            Arc::new(StaticContacts::new(contacts())),
        );
        let convs = assembler.list_conversations().await;
        let order: Vec<i64> = convs.iter().map(|c| c.chat_id).collect();
        assert_eq!(order, vec![busy, quiet, empty]);
        let preview = convs[0].last_message.as_ref().unwrap();
        assert_eq!(preview.text, "new");
        assert_eq!(preview.sender_name.as_deref(), Some("Bob"));
        assert!(convs[2].last_message.is_none());
    }

    #[tokio::test]
    async fn list_messages_is_empty_when_store_fails() {
        let store = MockStore::new();
        let chat = store.add_chat(None, &["+15550001"]);
        store.add_message(chat, Some("+15550001"), "hi", 1);
        store.set_failing(true);

        let assembler = Assembler::new(
            StoreReader::new(Arc::new(store)),
            Arc::new(StaticContacts::default()),
        );
        assert!(assembler.list_messages(chat, 10).await.is_empty());
        assert!(assembler.list_conversations().await.is_empty());
    }
}

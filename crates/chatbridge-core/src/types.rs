// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the store, the relay core, and the gateway.
//!
//! Raw `*Row` types are read-only projections of chat store rows. `*View`
//! types are what clients receive; they are assembled per request and never
//! persisted.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Maximum number of full dispatch-and-verify cycles for one outbound message.
pub const DEFAULT_MAX_SEND_ATTEMPTS: u32 = 3;

/// Seconds between the Unix epoch and the Apple reference date (2001-01-01).
const APPLE_EPOCH_OFFSET_SECS: i64 = 978_307_200;

/// Store timestamps above this are nanoseconds; below it they are seconds.
const NANOSECOND_THRESHOLD: i64 = 1_000_000_000_000;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Store,
    Notifier,
    Sender,
    Contacts,
}

/// Convert a chat store timestamp (Apple epoch) to UTC.
///
/// Older stores record whole seconds, newer ones nanoseconds; both are
/// accepted. Returns `None` for zero (the store's "absent" value).
pub fn apple_timestamp_to_utc(raw: i64) -> Option<DateTime<Utc>> {
    if raw == 0 {
        return None;
    }
    let (secs, nanos) = if raw.abs() >= NANOSECOND_THRESHOLD {
        (raw.div_euclid(1_000_000_000), raw.rem_euclid(1_000_000_000) as u32)
    } else {
        (raw, 0)
    };
    Utc.timestamp_opt(secs + APPLE_EPOCH_OFFSET_SECS, nanos).single()
}

// --- Store rows ---

/// A message row joined with its chat and optional attachment metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRow {
    /// Store row id.
    pub id: i64,
    /// Globally unique message guid.
    pub guid: String,
    /// Owning chat row id.
    pub chat_id: i64,
    /// Sender handle row id. `None` (or 0 in the store) when self-authored.
    pub handle_id: Option<i64>,
    /// Body text. Attachment placeholders appear as U+FFFC.
    pub text: Option<String>,
    /// Creation timestamp (Apple epoch).
    pub date: i64,
    /// Delivery timestamp, if delivered.
    pub date_delivered: Option<i64>,
    /// Read timestamp, if read.
    pub date_read: Option<i64>,
    /// Store error code; 0 means no error.
    pub error: i64,
    /// Whether the local account authored the message.
    pub is_from_me: bool,
    /// Joined attachment row id, if any.
    pub attachment_id: Option<i64>,
    /// Joined attachment MIME type.
    pub attachment_mime_type: Option<String>,
    /// Joined attachment original filename.
    pub attachment_transfer_name: Option<String>,
}

/// A handle row mapping the store's numeric participant id to a phone/email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleRow {
    pub id: i64,
    pub identifier: String,
}

/// One chat-membership join row: a chat plus one participant identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipRow {
    pub chat_id: i64,
    pub chat_guid: String,
    pub chat_identifier: Option<String>,
    /// The store's own group name; empty or `None` when not set.
    pub display_name: Option<String>,
    pub participant: String,
}

/// Attachment metadata. Read-only projection of an attachment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    pub id: i64,
    pub guid: String,
    pub message_id: Option<i64>,
    /// Path on disk, possibly `~`-prefixed.
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub transfer_name: Option<String>,
}

// --- Views ---

/// Attachment summary attached to a [`MessageView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_name: Option<String>,
}

/// A message as presented to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: i64,
    pub guid: String,
    pub chat_id: i64,
    pub text: String,
    pub date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_delivered: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_read: Option<i64>,
    pub error: i64,
    pub is_from_me: bool,
    /// Sender identifier (phone/email), when the handle resolves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Human name for `sender`, when it is in the contact table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    pub has_attachment: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentRef>,
}

/// A conversation as presented to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationView {
    pub chat_id: i64,
    pub guid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_identifier: Option<String>,
    pub display_name: String,
    /// `true` when `display_name` was synthesized from participant names.
    pub has_manual_display_name: bool,
    /// Comma-joined participant identifiers in row-encounter order.
    #[serde(rename = "IDs")]
    pub ids: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<MessageView>,
}

// --- Outbound sends ---

/// Lifecycle state of a [`PendingSend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SendState {
    /// Waiting for its turn at the queue head.
    Queued,
    /// Dispatched; the store is being polled for confirmation.
    InFlight,
    /// A matching self-authored row was found.
    Verified,
    /// The attempt bound was reached without confirmation.
    Failed,
    /// Verification failed below the bound; re-queued at the tail.
    Retrying,
}

/// An outbound message awaiting dispatch and verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSend {
    pub id: uuid::Uuid,
    pub body: String,
    /// Raw comma-joined recipient list.
    pub recipients: String,
    /// Completed dispatch-and-verify cycles that did not confirm.
    pub attempts: u32,
    pub state: SendState,
}

impl PendingSend {
    /// Create a queued send with a zero attempt counter.
    pub fn new(recipients: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            body: body.into(),
            recipients: recipients.into(),
            attempts: 0,
            state: SendState::Queued,
        }
    }

    /// The body as it will appear in the store once sent.
    ///
    /// The external sender drops trailing whitespace and newlines.
    pub fn normalized_body(&self) -> &str {
        self.body.trim_end()
    }

    /// Apply the outcome of one verification cycle.
    ///
    /// A confirmed cycle moves to `Verified`. An unconfirmed cycle bumps the
    /// counter and moves to `Failed` once it reaches `max_attempts`,
    /// otherwise to `Retrying` with the counter carried forward.
    pub fn record_cycle(&mut self, confirmed: bool, max_attempts: u32) -> SendState {
        self.state = if confirmed {
            SendState::Verified
        } else {
            self.attempts += 1;
            if self.attempts >= max_attempts {
                SendState::Failed
            } else {
                SendState::Retrying
            }
        };
        self.state
    }
}

// --- Live updates ---

/// A change notification pushed to live subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// The refreshed conversation list after a poll batch.
    Conversations { conversations: Vec<ConversationView> },
    /// An outbound message was confirmed in the store.
    MessageSent {
        send_id: uuid::Uuid,
        message: MessageView,
    },
    /// An outbound message exhausted its attempts.
    SendFailed {
        send_id: uuid::Uuid,
        text: String,
        recipients: String,
        attempts: u32,
    },
}

// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message reads: per-chat history, rows past a watermark, and recent
//! self-authored rows for send verification.

use chatbridge_core::types::MessageRow;
use chatbridge_core::BridgeError;
use rusqlite::{params, Row};

use crate::database::{map_tr_err, ChatDatabase};

/// Columns shared by every message query. Joins the owning chat and the
/// message's first attachment, if any.
const MESSAGE_SELECT: &str = "
SELECT m.ROWID, m.guid, COALESCE(cmj.chat_id, 0), m.handle_id, m.text, m.date,
       m.date_delivered, m.date_read, m.error, m.is_from_me,
       a.ROWID, a.mime_type, a.transfer_name
FROM message m
LEFT JOIN chat_message_join cmj ON cmj.message_id = m.ROWID
LEFT JOIN (
    SELECT message_id, MIN(attachment_id) AS attachment_id
    FROM message_attachment_join
    GROUP BY message_id
) maj ON maj.message_id = m.ROWID
LEFT JOIN attachment a ON a.ROWID = maj.attachment_id";

/// Treat the store's zero sentinel as absent.
fn non_zero(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v != 0)
}

fn map_message_row(row: &Row<'_>) -> Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        id: row.get(0)?,
        guid: row.get(1)?,
        chat_id: row.get(2)?,
        handle_id: non_zero(row.get(3)?),
        text: row.get(4)?,
        date: row.get::<_, Option<i64>>(5)?.unwrap_or_default(),
        date_delivered: non_zero(row.get(6)?),
        date_read: non_zero(row.get(7)?),
        error: row.get::<_, Option<i64>>(8)?.unwrap_or_default(),
        is_from_me: row.get::<_, Option<bool>>(9)?.unwrap_or_default(),
        attachment_id: row.get(10)?,
        attachment_mime_type: row.get(11)?,
        attachment_transfer_name: row.get(12)?,
    })
}

/// The `limit` most recent messages in `chat_id`, newest first.
pub async fn recent_for_chat(
    db: &ChatDatabase,
    chat_id: i64,
    limit: usize,
) -> Result<Vec<MessageRow>, BridgeError> {
    let limit = limit as i64;
    db.connection()
        .call(move |conn| -> Result<Vec<MessageRow>, rusqlite::Error> {
            let sql = format!(
                "{MESSAGE_SELECT} WHERE cmj.chat_id = ?1 ORDER BY m.date DESC, m.ROWID DESC LIMIT ?2"
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params![chat_id, limit], map_message_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Up to `limit` messages with `date` strictly after `watermark`, oldest first.
pub async fn since(
    db: &ChatDatabase,
    watermark: i64,
    limit: usize,
) -> Result<Vec<MessageRow>, BridgeError> {
    let limit = limit as i64;
    db.connection()
        .call(move |conn| -> Result<Vec<MessageRow>, rusqlite::Error> {
            let sql = format!(
                "{MESSAGE_SELECT} WHERE m.date > ?1 ORDER BY m.date ASC, m.ROWID ASC LIMIT ?2"
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params![watermark, limit], map_message_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// The most recent self-authored, error-free messages, newest first.
pub async fn recent_sent(
    db: &ChatDatabase,
    limit: usize,
) -> Result<Vec<MessageRow>, BridgeError> {
    let limit = limit as i64;
    db.connection()
        .call(move |conn| -> Result<Vec<MessageRow>, rusqlite::Error> {
            let sql = format!(
                "{MESSAGE_SELECT} WHERE m.is_from_me = 1 AND m.error = 0
                 ORDER BY m.date DESC, m.ROWID DESC LIMIT ?1"
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params![limit], map_message_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// The newest message timestamp, as zero or one rows.
///
/// Returned as a list so callers can tell an empty store from a store whose
/// newest row happens to be dated zero.
pub async fn latest_timestamp(db: &ChatDatabase) -> Result<Vec<i64>, BridgeError> {
    db.connection()
        .call(|conn| -> Result<Vec<i64>, rusqlite::Error> {
            let mut stmt =
                conn.prepare_cached("SELECT date FROM message ORDER BY date DESC LIMIT 1")?;
            let rows = stmt.query_map([], |row| {
                row.get::<_, Option<i64>>(0).map(Option::unwrap_or_default)
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

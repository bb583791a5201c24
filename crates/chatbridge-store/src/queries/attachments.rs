// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment metadata reads.

use chatbridge_core::types::AttachmentMeta;
use chatbridge_core::BridgeError;
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, ChatDatabase};

/// Look up one attachment by row id, with the message it belongs to.
pub async fn get(db: &ChatDatabase, id: i64) -> Result<Option<AttachmentMeta>, BridgeError> {
    db.connection()
        .call(move |conn| -> Result<Option<AttachmentMeta>, rusqlite::Error> {
            conn.query_row(
                "SELECT a.ROWID, a.guid, maj.message_id, a.filename, a.mime_type, a.transfer_name
                 FROM attachment a
                 LEFT JOIN message_attachment_join maj ON maj.attachment_id = a.ROWID
                 WHERE a.ROWID = ?1
                 LIMIT 1",
                params![id],
                |row| {
                    Ok(AttachmentMeta {
                        id: row.get(0)?,
                        guid: row.get(1)?,
                        message_id: row.get(2)?,
                        filename: row.get(3)?,
                        mime_type: row.get(4)?,
                        transfer_name: row.get(5)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handle and chat-membership reads.

use chatbridge_core::types::{HandleRow, MembershipRow};
use chatbridge_core::BridgeError;

use crate::database::{map_tr_err, ChatDatabase};

/// Every handle row.
pub async fn handles(db: &ChatDatabase) -> Result<Vec<HandleRow>, BridgeError> {
    db.connection()
        .call(|conn| -> Result<Vec<HandleRow>, rusqlite::Error> {
            let mut stmt = conn.prepare_cached("SELECT ROWID, id FROM handle ORDER BY ROWID")?;
            let rows = stmt.query_map([], |row| {
                Ok(HandleRow {
                    id: row.get(0)?,
                    identifier: row.get(1)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Every (chat, participant) pair, grouped by chat in join-table order.
///
/// A chat with no participants produces no rows.
pub async fn memberships(db: &ChatDatabase) -> Result<Vec<MembershipRow>, BridgeError> {
    db.connection()
        .call(|conn| -> Result<Vec<MembershipRow>, rusqlite::Error> {
            let mut stmt = conn.prepare_cached(
                "SELECT c.ROWID, c.guid, c.chat_identifier, c.display_name, h.id
                 FROM chat c
                 JOIN chat_handle_join chj ON chj.chat_id = c.ROWID
                 JOIN handle h ON h.ROWID = chj.handle_id
                 ORDER BY c.ROWID, chj.rowid",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(MembershipRow {
                    chat_id: row.get(0)?,
                    chat_guid: row.get(1)?,
                    chat_identifier: row.get(2)?,
                    display_name: row.get(3)?,
                    participant: row.get(4)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::Fixture;

    #[tokio::test]
    async fn memberships_follow_join_order() {
        let mut fx = Fixture::new();
        let a = fx.handle("+15550010");
        let b = fx.handle("b@example.com");
        let c = fx.handle("+15550030");
        let group = fx.chat(Some("Climbing"), &[b, a, c]);
        let direct = fx.chat(None, &[a]);
        fx.chat(None, &[]);

        let db = ChatDatabase::open_read_only(&fx.path).await.unwrap();
        let rows = memberships(&db).await.unwrap();
        assert_eq!(rows.len(), 4);

        let group_rows: Vec<&str> = rows
            .iter()
            .filter(|r| r.chat_id == group)
            .map(|r| r.participant.as_str())
            .collect();
        assert_eq!(group_rows, vec!["b@example.com", "+15550010", "+15550030"]);
        assert_eq!(rows[0].display_name.as_deref(), Some("Climbing"));

        let direct_row = rows.iter().find(|r| r.chat_id == direct).unwrap();
        assert_eq!(direct_row.display_name.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn handles_lists_all_identifiers() {
        let mut fx = Fixture::new();
        let a = fx.handle("+15550010");
        let b = fx.handle("b@example.com");

        let db = ChatDatabase::open_read_only(&fx.path).await.unwrap();
        let rows = handles(&db).await.unwrap();
        assert_eq!(
            rows,
            vec![
                HandleRow { id: a, identifier: "+15550010".into() },
                HandleRow { id: b, identifier: "b@example.com".into() },
            ]
        );
    }
}

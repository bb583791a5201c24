// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test fixture: a temp-dir chat database with the client's table layout.

use std::path::PathBuf;

use rusqlite::{params, Connection};
use tempfile::TempDir;

const SCHEMA: &str = "
CREATE TABLE handle (
    ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL,
    service TEXT NOT NULL DEFAULT 'iMessage'
);
CREATE TABLE chat (
    ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
    guid TEXT UNIQUE NOT NULL,
    chat_identifier TEXT,
    display_name TEXT
);
CREATE TABLE message (
    ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
    guid TEXT UNIQUE NOT NULL,
    text TEXT,
    handle_id INTEGER DEFAULT 0,
    date INTEGER,
    date_delivered INTEGER DEFAULT 0,
    date_read INTEGER DEFAULT 0,
    error INTEGER DEFAULT 0,
    is_from_me INTEGER DEFAULT 0
);
CREATE TABLE chat_handle_join (chat_id INTEGER, handle_id INTEGER);
CREATE TABLE chat_message_join (chat_id INTEGER, message_id INTEGER);
CREATE TABLE attachment (
    ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
    guid TEXT UNIQUE NOT NULL,
    filename TEXT,
    mime_type TEXT,
    transfer_name TEXT
);
CREATE TABLE message_attachment_join (message_id INTEGER, attachment_id INTEGER);
";

/// A writable handle on a fresh chat database.
pub struct Fixture {
    pub dir: TempDir,
    pub path: PathBuf,
    conn: Connection,
    next_guid: u32,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        Self {
            dir,
            path,
            conn,
            next_guid: 0,
        }
    }

    fn guid(&mut self, prefix: &str) -> String {
        self.next_guid += 1;
        format!("{prefix}-{}", self.next_guid)
    }

    pub fn handle(&mut self, identifier: &str) -> i64 {
        self.conn
            .execute("INSERT INTO handle (id) VALUES (?1)", params![identifier])
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub fn chat(&mut self, display_name: Option<&str>, handles: &[i64]) -> i64 {
        let guid = self.guid("chat");
        self.conn
            .execute(
                "INSERT INTO chat (guid, chat_identifier, display_name) VALUES (?1, ?1, ?2)",
                params![guid, display_name.unwrap_or("")],
            )
            .unwrap();
        let chat_id = self.conn.last_insert_rowid();
        for handle in handles {
            self.conn
                .execute(
                    "INSERT INTO chat_handle_join (chat_id, handle_id) VALUES (?1, ?2)",
                    params![chat_id, handle],
                )
                .unwrap();
        }
        chat_id
    }

    /// Insert a message into `chat_id`. `handle_id` 0 marks it self-authored.
    pub fn message(&mut self, chat_id: i64, handle_id: i64, text: &str, date: i64) -> i64 {
        self.message_full(chat_id, handle_id, text, date, 0)
    }

    pub fn message_full(
        &mut self,
        chat_id: i64,
        handle_id: i64,
        text: &str,
        date: i64,
        error: i64,
    ) -> i64 {
        let guid = self.guid("msg");
        self.conn
            .execute(
                "INSERT INTO message (guid, text, handle_id, date, error, is_from_me)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![guid, text, handle_id, date, error, handle_id == 0],
            )
            .unwrap();
        let message_id = self.conn.last_insert_rowid();
        self.conn
            .execute(
                "INSERT INTO chat_message_join (chat_id, message_id) VALUES (?1, ?2)",
                params![chat_id, message_id],
            )
            .unwrap();
        message_id
    }

    pub fn attachment(&mut self, message_id: i64, filename: &str, mime: &str) -> i64 {
        let guid = self.guid("att");
        let transfer_name = filename.rsplit('/').next().unwrap_or(filename).to_string();
        self.conn
            .execute(
                "INSERT INTO attachment (guid, filename, mime_type, transfer_name)
                 VALUES (?1, ?2, ?3, ?4)",
                params![guid, filename, mime, transfer_name],
            )
            .unwrap();
        let attachment_id = self.conn.last_insert_rowid();
        self.conn
            .execute(
                "INSERT INTO message_attachment_join (message_id, attachment_id) VALUES (?1, ?2)",
                params![message_id, attachment_id],
            )
            .unwrap();
        attachment_id
    }

    /// Drop a table so queries against it fail.
    pub fn break_table(&mut self, table: &str) {
        self.conn
            .execute_batch(&format!("DROP TABLE {table};"))
            .unwrap();
    }
}

/// An empty database with the full schema.
pub fn empty_store() -> (TempDir, PathBuf) {
    let fixture = Fixture::new();
    (fixture.dir, fixture.path)
}

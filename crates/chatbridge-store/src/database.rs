// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only connection to the chat database.
//!
//! The messaging client owns the file and writes to it concurrently; this
//! process only ever reads. Every query runs on tokio-rusqlite's single
//! background thread.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chatbridge_core::BridgeError;
use rusqlite::OpenFlags;
use tracing::debug;

/// How long a read waits on the client's write lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Handle to the chat database opened read-only.
#[derive(Clone)]
pub struct ChatDatabase {
    conn: tokio_rusqlite::Connection,
    path: PathBuf,
}

impl ChatDatabase {
    /// Open the database at `path` without write access.
    ///
    /// Fails if the file does not exist; the store is never created here.
    pub async fn open_read_only(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(BridgeError::storage(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("chat database not found at {}", path.display()),
            )));
        }

        let conn = tokio_rusqlite::Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .await
        .map_err(BridgeError::storage)?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path = %path.display(), "chat database opened read-only");
        Ok(Self { conn, path })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Path the database was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Convert a tokio-rusqlite error into a storage error.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> BridgeError {
    BridgeError::storage(e)
}

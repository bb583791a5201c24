// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only access to the messaging client's SQLite chat database.
//!
//! The database is owned and written by the client; this crate opens it
//! read-only through `tokio-rusqlite` and exposes typed queries plus the
//! [`SqliteChatStore`] adapter implementing
//! [`ChatStore`](chatbridge_core::ChatStore).

pub mod adapter;
pub mod database;
pub mod queries;

#[cfg(test)]
mod fixture;

pub use adapter::{expand_home, SqliteChatStore};
pub use database::ChatDatabase;

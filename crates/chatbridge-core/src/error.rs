// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for ChatBridge.

use thiserror::Error;

/// The primary error type used across all ChatBridge crates.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Chat store errors (database open, query failure, row decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The poll watermark could not be established from the store.
    ///
    /// This is fatal: polling never starts.
    #[error("watermark initialization failed: {0}")]
    Watermark(String),

    /// HTTP/WebSocket gateway errors (bind failure, server crash).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Outbound notification delivery failed.
    #[error("notification error: {message}")]
    Notify {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The external sender could not be invoked, or the send queue is closed.
    #[error("send error: {message}")]
    Send { message: String },

    /// Authentication or exposure policy violations.
    #[error("security error: {0}")]
    Security(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Wrap any error as a storage error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BridgeError::Storage {
            source: Box::new(err),
        }
    }
}

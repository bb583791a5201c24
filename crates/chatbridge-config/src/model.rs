// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for ChatBridge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level ChatBridge configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatBridgeConfig {
    /// HTTP/WebSocket server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat database location.
    #[serde(default)]
    pub store: StoreConfig,

    /// Poll loop timing.
    #[serde(default)]
    pub poll: PollConfig,

    /// Outbound send queue and external sender settings.
    #[serde(default)]
    pub send: SendConfig,

    /// Outbound notification settings.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Live update fan-out settings.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Static contact name table.
    #[serde(default)]
    pub contacts: ContactsConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// HTTP/WebSocket server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret clients must present. `None` refuses to serve.
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8735
}

/// Chat database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Path to the messaging client's SQLite database. Opened read-only.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::home_dir()
        .map(|p| p.join("Library").join("Messages").join("chat.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("chat.db"))
        .to_string_lossy()
        .into_owned()
}

/// Poll loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollConfig {
    /// Milliseconds between ticks.
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// Maximum new rows processed per tick.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_batch_size() -> usize {
    50
}

/// Outbound send queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SendConfig {
    /// Milliseconds between store checks while verifying a send.
    #[serde(default = "default_verify_interval_ms")]
    pub verify_interval_ms: u64,

    /// Store checks per dispatch before the cycle counts as unconfirmed.
    #[serde(default = "default_verify_attempts")]
    pub verify_attempts: u32,

    /// Dispatch cycles before a send is reported as failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Program that injects a message into the messaging client.
    #[serde(default = "default_sender_program")]
    pub sender_program: String,

    /// Arguments for `sender_program`. `{body}` and `{recipients}` are substituted.
    #[serde(default = "default_sender_args")]
    pub sender_args: Vec<String>,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            verify_interval_ms: default_verify_interval_ms(),
            verify_attempts: default_verify_attempts(),
            max_attempts: default_max_attempts(),
            sender_program: default_sender_program(),
            sender_args: default_sender_args(),
        }
    }
}

fn default_verify_interval_ms() -> u64 {
    1000
}

fn default_verify_attempts() -> u32 {
    13
}

fn default_max_attempts() -> u32 {
    3
}

fn default_sender_program() -> String {
    "osascript".to_string()
}

fn default_sender_args() -> Vec<String> {
    vec![
        "send-message.applescript".to_string(),
        "{body}".to_string(),
        "{recipients}".to_string(),
    ]
}

/// Outbound notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// Webhook receiving `{title, body, context}` JSON. `None` logs only.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Request timeout for the webhook in seconds.
    #[serde(default = "default_notify_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: default_notify_timeout_secs(),
        }
    }
}

fn default_notify_timeout_secs() -> u64 {
    5
}

/// Live update broadcaster configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BroadcastConfig {
    /// Longest a single subscriber may block a broadcast, in milliseconds.
    /// A subscriber that exceeds it is dropped.
    #[serde(default = "default_subscriber_timeout_ms")]
    pub subscriber_timeout_ms: u64,

    /// Per-subscriber channel capacity.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            subscriber_timeout_ms: default_subscriber_timeout_ms(),
            subscriber_buffer: default_subscriber_buffer(),
        }
    }
}

fn default_subscriber_timeout_ms() -> u64 {
    250
}

fn default_subscriber_buffer() -> usize {
    64
}

/// Contact name table.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContactsConfig {
    /// Identifier (phone/email as stored) -> display name.
    #[serde(default)]
    pub names: BTreeMap<String, String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./chatbridge.toml` > `~/.config/chatbridge/chatbridge.toml`
//! > `/etc/chatbridge/chatbridge.toml` with environment variable overrides via
//! the `CHATBRIDGE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ChatBridgeConfig;

/// Config sections, used to map `CHATBRIDGE_<SECTION>_<KEY>` to `section.key`.
const SECTIONS: &[&str] = &[
    "server",
    "store",
    "poll",
    "send",
    "notify",
    "broadcast",
    "contacts",
    "log",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/chatbridge/chatbridge.toml` (system-wide)
/// 3. `~/.config/chatbridge/chatbridge.toml` (user XDG config)
/// 4. `./chatbridge.toml` (local directory)
/// 5. `CHATBRIDGE_*` environment variables
pub fn load_config() -> Result<ChatBridgeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ChatBridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatBridgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ChatBridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatBridgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ChatBridgeConfig::default()))
        .merge(Toml::file("/etc/chatbridge/chatbridge.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("chatbridge/chatbridge.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("chatbridge.toml"))
        .merge(env_provider())
}

/// Map a lowercased, prefix-stripped env key to its dotted config path.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `server_auth_token` maps to `server.auth_token`, not `server.auth.token`.
pub fn env_key_to_path(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

/// Create the environment variable provider using explicit `map()`.
fn env_provider() -> Env {
    Env::prefixed("CHATBRIDGE_").map(|key| env_key_to_path(key.as_str()).into())
}

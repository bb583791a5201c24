// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints that serde attributes cannot express: bounded
//! poll batches, non-zero retry counts, usable addresses and URL schemes.

use crate::diagnostic::ConfigError;
use crate::model::ChatBridgeConfig;

/// Largest batch the poll loop may request per tick.
pub const MAX_BATCH_SIZE: usize = 100;

/// Shortest poll interval accepted, in milliseconds.
pub const MIN_POLL_INTERVAL_MS: u64 = 50;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &ChatBridgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::validation(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if let Some(token) = &config.server.auth_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "server.auth_token must not be blank; omit it to disable serving",
        ));
    }

    if config.store.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "store.database_path must not be empty",
        ));
    }

    if config.poll.batch_size == 0 || config.poll.batch_size > MAX_BATCH_SIZE {
        errors.push(ConfigError::validation(format!(
            "poll.batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}",
            config.poll.batch_size
        )));
    }

    if config.poll.interval_ms < MIN_POLL_INTERVAL_MS {
        errors.push(ConfigError::validation(format!(
            "poll.interval_ms must be at least {MIN_POLL_INTERVAL_MS}, got {}",
            config.poll.interval_ms
        )));
    }

    if config.send.verify_attempts == 0 {
        errors.push(ConfigError::validation(
            "send.verify_attempts must be at least 1",
        ));
    }

    if config.send.max_attempts == 0 {
        errors.push(ConfigError::validation("send.max_attempts must be at least 1"));
    }

    if config.send.sender_program.trim().is_empty() {
        errors.push(ConfigError::validation(
            "send.sender_program must not be empty",
        ));
    }

    if let Some(url) = &config.notify.webhook_url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        errors.push(ConfigError::validation(format!(
            "notify.webhook_url `{url}` must start with http:// or https://"
        )));
    }

    if config.broadcast.subscriber_buffer == 0 {
        errors.push(ConfigError::validation(
            "broadcast.subscriber_buffer must be at least 1",
        ));
    }

    const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
    if !LEVELS.contains(&config.log.level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "log.level `{}` must be one of: {}",
            config.log.level,
            LEVELS.join(", ")
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&ChatBridgeConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ChatBridgeConfig::default();
        config.poll.batch_size = 0;
        config.poll.interval_ms = 10;
        config.send.max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn batch_size_upper_bound_is_inclusive() {
        let mut config = ChatBridgeConfig::default();
        config.poll.batch_size = MAX_BATCH_SIZE;
        assert!(validate_config(&config).is_ok());
        config.poll.batch_size = MAX_BATCH_SIZE + 1;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn webhook_requires_http_scheme() {
        let mut config = ChatBridgeConfig::default();
        config.notify.webhook_url = Some("ftp://example.com/hook".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("notify.webhook_url"));
    }

    #[test]
    fn blank_auth_token_is_rejected() {
        let mut config = ChatBridgeConfig::default();
        config.server.auth_token = Some("   ".into());
        assert!(validate_config(&config).is_err());
    }
}

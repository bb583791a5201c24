// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External-program sender.
//!
//! Runs a configured program (an AppleScript runner by default) with the
//! body and recipients substituted into its arguments. The exit status is
//! logged but carries no delivery guarantee; the send queue confirms
//! delivery by re-reading the store.

use async_trait::async_trait;
use tracing::debug;

use chatbridge_config::model::SendConfig;
use chatbridge_core::{AdapterType, BridgeError, OutboundSender, PluginAdapter};

const BODY_PLACEHOLDER: &str = "{body}";
const RECIPIENTS_PLACEHOLDER: &str = "{recipients}";

/// Sends by spawning an external program.
#[derive(Debug, Clone)]
pub struct CommandSender {
    program: String,
    args: Vec<String>,
}

impl CommandSender {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &SendConfig) -> Self {
        Self::new(config.sender_program.clone(), config.sender_args.clone())
    }

    /// Arguments with placeholders filled in.
    pub fn render_args(&self, body: &str, recipients: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace(BODY_PLACEHOLDER, body)
                    .replace(RECIPIENTS_PLACEHOLDER, recipients)
            })
            .collect()
    }
}

#[async_trait]
impl PluginAdapter for CommandSender {
    fn name(&self) -> &str {
        "command"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Sender
    }
}

#[async_trait]
impl OutboundSender for CommandSender {
    async fn send(&self, body: &str, recipients: &str) -> Result<(), BridgeError> {
        let output = tokio::process::Command::new(&self.program)
            .args(self.render_args(body, recipients))
            .output()
            .await
            .map_err(|e| BridgeError::Send {
                message: format!("failed to run {}: {e}", self.program),
            })?;

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BridgeError::Send {
                message: format!("{} exited with {exit_code}: {}", self.program, stderr.trim()),
            });
        }
        debug!(program = %self.program, "sender finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_substituted_in_every_arg() {
        let sender = CommandSender::new(
            "osascript",
            vec![
                "send.applescript".into(),
                "{body}".into(),
                "to={recipients}".into(),
            ],
        );
        assert_eq!(
            sender.render_args("hi there", "a@x.com,+1555"),
            vec!["send.applescript", "hi there", "to=a@x.com,+1555"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_program_is_ok() {
        let sender = CommandSender::new("sh", vec!["-c".into(), "exit 0".into()]);
        assert!(sender.send("body", "to").await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_program_reports_exit_code() {
        let sender = CommandSender::new("sh", vec!["-c".into(), "echo nope >&2; exit 3".into()]);
        let err = sender.send("body", "to").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("exited with 3"), "got: {message}");
        assert!(message.contains("nope"));
    }

    #[tokio::test]
    async fn missing_program_is_a_send_error() {
        let sender = CommandSender::new("/nonexistent/chatbridge-sender", Vec::new());
        assert!(matches!(
            sender.send("b", "r").await,
            Err(BridgeError::Send { .. })
        ));
    }
}

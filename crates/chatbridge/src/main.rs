// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ChatBridge - serve a local chat database over HTTP, WebSocket, and SSE.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod doctor;
mod dump;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use chatbridge_config::{ChatBridgeConfig, ConfigError};

/// ChatBridge - serve a local chat database over HTTP, WebSocket, and SSE.
#[derive(Parser, Debug)]
#[command(name = "chatbridge", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the relay and the HTTP gateway.
    Serve,
    /// Check configuration, chat database, sender, and webhook.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Print the assembled conversation list as JSON.
    Conversations,
    /// Print the most recent messages of a chat as JSON.
    Messages {
        chat_id: i64,
        #[arg(long, default_value_t = 25)]
        limit: usize,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<ChatBridgeConfig, Vec<ConfigError>> {
    match path {
        Some(path) => chatbridge_config::load_and_validate_path(path),
        None => chatbridge_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            chatbridge_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Doctor { plain }) => doctor::run_doctor(&config, plain).await,
        Some(Commands::Conversations) => dump::run_conversations(&config).await,
        Some(Commands::Messages { chat_id, limit }) => {
            dump::run_messages(&config, chat_id, limit).await
        }
        None => {
            println!("chatbridge: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("chatbridge: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_messages_subcommand() {
        let cli = Cli::try_parse_from(["chatbridge", "messages", "42", "--limit", "5"]).unwrap();
        match cli.command {
            Some(Commands::Messages { chat_id, limit }) => {
                assert_eq!(chat_id, 42);
                assert_eq!(limit, 5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_accepts_global_config_flag() {
        let cli =
            Cli::try_parse_from(["chatbridge", "doctor", "--config", "/tmp/cb.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/cb.toml")));
        assert!(matches!(cli.command, Some(Commands::Doctor { plain: false })));
    }

    #[test]
    fn explicit_config_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatbridge.toml");
        std::fs::write(&path, "[poll]\nbatch_size = 7\n").unwrap();
        let config = load_config(Some(&path)).expect("valid config");
        assert_eq!(config.poll.batch_size, 7);
    }
}

// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatbridge serve` command implementation.
//!
//! Opens the chat store read-only, starts the relay (poll loop and send
//! worker), and serves the gateway until SIGINT/SIGTERM.

use std::sync::Arc;

use tracing::{error, info};

use chatbridge_config::ChatBridgeConfig;
use chatbridge_core::BridgeError;
use chatbridge_gateway::{AuthConfig, GatewayState};
use chatbridge_relay::contacts::StaticContacts;
use chatbridge_relay::sender::CommandSender;
use chatbridge_relay::{notify, Collaborators, Relay};
use chatbridge_store::SqliteChatStore;

use crate::shutdown;

/// Runs the `chatbridge serve` command.
pub async fn run_serve(config: ChatBridgeConfig) -> Result<(), BridgeError> {
    init_tracing(&config.log.level);

    info!("starting chatbridge serve");

    let Some(token) = config.server.auth_token.clone() else {
        error!("server.auth_token is not set -- refusing to serve");
        return Err(BridgeError::Security(
            "server.auth_token must be set (or CHATBRIDGE_SERVER_AUTH_TOKEN)".to_string(),
        ));
    };

    let store = SqliteChatStore::open(&config.store).await.inspect_err(|e| {
        error!(path = %config.store.database_path, error = %e, "cannot open chat store");
    })?;

    let collaborators = Collaborators {
        store: Arc::new(store),
        sender: Arc::new(CommandSender::from_config(&config.send)),
        notifier: notify::from_config(&config.notify)?,
        contacts: Arc::new(StaticContacts::from_config(&config.contacts.names)),
    };

    let cancel = shutdown::install_signal_handler();

    let relay = Relay::start(collaborators, &config, cancel.clone())
        .await
        .inspect_err(|e| error!(error = %e, "relay failed to start"))?;

    let state = GatewayState::new(relay.clone(), AuthConfig::new(Some(token)));
    let served = chatbridge_gateway::serve(&config.server, state, cancel.clone()).await;

    // The gateway may also stop on its own (bind failure); stop the relay too.
    cancel.cancel();
    relay.wait().await;
    info!("chatbridge stopped");
    served
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chatbridge={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

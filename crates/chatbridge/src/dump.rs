// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatbridge conversations` and `chatbridge messages` implementations.
//!
//! One-shot reads through the same assembler the gateway uses, printed as
//! pretty JSON on stdout.

use std::sync::Arc;

use serde::Serialize;

use chatbridge_config::ChatBridgeConfig;
use chatbridge_core::BridgeError;
use chatbridge_relay::contacts::StaticContacts;
use chatbridge_relay::{Assembler, StoreReader};
use chatbridge_store::SqliteChatStore;

async fn open_assembler(config: &ChatBridgeConfig) -> Result<Assembler, BridgeError> {
    let store = SqliteChatStore::open(&config.store).await?;
    Ok(Assembler::new(
        StoreReader::new(Arc::new(store)),
        Arc::new(StaticContacts::from_config(&config.contacts.names)),
    ))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), BridgeError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| BridgeError::Internal(format!("failed to render JSON: {e}")))?;
    println!("{rendered}");
    Ok(())
}

pub async fn run_conversations(config: &ChatBridgeConfig) -> Result<(), BridgeError> {
    let assembler = open_assembler(config).await?;
    print_json(&assembler.list_conversations().await)
}

pub async fn run_messages(
    config: &ChatBridgeConfig,
    chat_id: i64,
    limit: usize,
) -> Result<(), BridgeError> {
    let assembler = open_assembler(config).await?;
    print_json(&assembler.list_messages(chat_id, limit).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_database_is_an_error() {
        let mut config = ChatBridgeConfig::default();
        config.store.database_path = "/tmp/nonexistent-chatbridge-test-xyz/chat.db".to_string();
        assert!(run_conversations(&config).await.is_err());
        assert!(run_messages(&config, 1, 5).await.is_err());
    }
}

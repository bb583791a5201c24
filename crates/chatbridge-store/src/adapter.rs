// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`ChatStore`] trait.

use async_trait::async_trait;
use tracing::debug;

use chatbridge_config::model::StoreConfig;
use chatbridge_core::types::{AttachmentMeta, HandleRow, MembershipRow, MessageRow};
use chatbridge_core::{AdapterType, BridgeError, ChatStore, HealthStatus, PluginAdapter};

use crate::database::{map_tr_err, ChatDatabase};
use crate::queries;

/// Chat store backed by the messaging client's SQLite file.
///
/// Wraps a read-only [`ChatDatabase`] and delegates to the typed query
/// modules. Errors are returned as-is; callers decide whether to fail soft.
#[derive(Clone)]
pub struct SqliteChatStore {
    db: ChatDatabase,
}

impl SqliteChatStore {
    /// Open the store named by `config`, expanding a leading `~/`.
    pub async fn open(config: &StoreConfig) -> Result<Self, BridgeError> {
        let path = expand_home(&config.database_path);
        let db = ChatDatabase::open_read_only(&path).await?;
        debug!(path = %path, "chat store initialized");
        Ok(Self { db })
    }

    /// Wrap an already opened database.
    pub fn from_database(db: ChatDatabase) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &ChatDatabase {
        &self.db
    }
}

/// Expand a leading `~/` to the home directory. Other paths pass through.
pub fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest).to_string_lossy().into_owned(),
        _ => path.to_string(),
    }
}

#[async_trait]
impl PluginAdapter for SqliteChatStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        let result = self
            .db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM chat", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err);
        Ok(match result {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}

#[async_trait]
impl ChatStore for SqliteChatStore {
    async fn recent_messages(
        &self,
        chat_id: i64,
        limit: usize,
    ) -> Result<Vec<MessageRow>, BridgeError> {
        queries::messages::recent_for_chat(&self.db, chat_id, limit).await
    }

    async fn handles(&self) -> Result<Vec<HandleRow>, BridgeError> {
        queries::chats::handles(&self.db).await
    }

    async fn memberships(&self) -> Result<Vec<MembershipRow>, BridgeError> {
        queries::chats::memberships(&self.db).await
    }

    async fn attachment(
        &self,
        attachment_id: i64,
    ) -> Result<Option<AttachmentMeta>, BridgeError> {
        queries::attachments::get(&self.db, attachment_id).await
    }

    async fn latest_timestamp(&self) -> Result<Vec<i64>, BridgeError> {
        queries::messages::latest_timestamp(&self.db).await
    }

    async fn messages_since(
        &self,
        watermark: i64,
        limit: usize,
    ) -> Result<Vec<MessageRow>, BridgeError> {
        queries::messages::since(&self.db, watermark, limit).await
    }

    async fn recent_sent(&self, limit: usize) -> Result<Vec<MessageRow>, BridgeError> {
        queries::messages::recent_sent(&self.db, limit).await
    }
}

// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact name lookup.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::traits::adapter::PluginAdapter;

/// Resolves participant identifiers to human names.
#[async_trait]
pub trait ContactDirectory: PluginAdapter {
    /// Identifier -> display name table, rebuilt on each call.
    async fn names(&self) -> HashMap<String, String>;
}

// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact directory backed by the `[contacts.names]` config table.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;

use chatbridge_core::{AdapterType, ContactDirectory, PluginAdapter};

/// Fixed identifier -> name table.
#[derive(Debug, Clone, Default)]
pub struct StaticContacts {
    names: HashMap<String, String>,
}

impl StaticContacts {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    pub fn from_config(names: &BTreeMap<String, String>) -> Self {
        Self::new(names.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

#[async_trait]
impl PluginAdapter for StaticContacts {
    fn name(&self) -> &str {
        "static-contacts"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Contacts
    }
}

#[async_trait]
impl ContactDirectory for StaticContacts {
    async fn names(&self) -> HashMap<String, String> {
        self.names.clone()
    }
}

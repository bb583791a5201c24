// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for ChatBridge.
//!
//! This crate provides the error type, the domain types shared between the
//! store, the relay core, and the gateway, and the collaborator traits the
//! relay is written against.

pub mod error;
pub mod traits;
pub mod types;

pub use error::BridgeError;
pub use types::{AdapterType, HealthStatus};

pub use traits::{ChatStore, ContactDirectory, Notifier, OutboundSender, PluginAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_error_variants_render() {
        let storage = BridgeError::storage(std::io::Error::other("disk"));
        assert_eq!(storage.to_string(), "storage error: disk");

        let watermark = BridgeError::Watermark("no rows".into());
        assert!(watermark.to_string().contains("no rows"));

        let _gateway = BridgeError::Gateway {
            message: "bind".into(),
            source: None,
        };
        let _notify = BridgeError::Notify {
            message: "webhook".into(),
            source: None,
        };
        let _send = BridgeError::Send {
            message: "closed".into(),
        };
        let timeout = BridgeError::Timeout {
            duration: std::time::Duration::from_secs(5),
        };
        assert!(timeout.to_string().contains("5s"));
    }

    #[test]
    fn adapter_type_round_trips_through_display() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Store,
            AdapterType::Notifier,
            AdapterType::Sender,
            AdapterType::Contacts,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_chat_store<T: ChatStore>() {}
        fn _assert_notifier<T: Notifier>() {}
        fn _assert_sender<T: OutboundSender>() {}
        fn _assert_contacts<T: ContactDirectory>() {}
    }
}

// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! All collaborators extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod contacts;
pub mod notifier;
pub mod sender;
pub mod store;

pub use adapter::PluginAdapter;
pub use contacts::ContactDirectory;
pub use notifier::Notifier;
pub use sender::OutboundSender;
pub use store::ChatStore;

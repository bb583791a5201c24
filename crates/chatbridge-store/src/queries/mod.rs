// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only query modules over the chat database tables.

pub mod attachments;
pub mod chats;
pub mod messages;

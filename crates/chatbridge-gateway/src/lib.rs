// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP, WebSocket, and SSE gateway over the ChatBridge relay.
//!
//! The gateway holds no state of its own beyond a [`Relay`] handle: reads go
//! straight to the assembler, sends go onto the relay's queue, and live
//! clients are broadcaster subscriptions.
//!
//! [`Relay`]: chatbridge_relay::Relay

pub mod auth;
pub mod handlers;
pub mod server;
pub mod sse;
pub mod ws;

pub use auth::AuthConfig;
pub use server::{router, serve, GatewayState};

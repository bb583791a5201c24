// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket live updates with inline sends (GET /ws).
//!
//! Server -> Client: every broadcast payload, verbatim, as a text frame.
//!
//! Client -> Server (JSON):
//! ```json
//! {"type": "send", "recipients": "+15551234567", "body": "on my way"}
//! ```
//! Accepted sends are acknowledged with
//! `{"type": "send_queued", "send_id": "..."}`; outcomes arrive later as
//! `message_sent` / `send_failed` events.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{Sink, SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::server::GatewayState;

/// Frames a client may send.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsIncoming {
    Send { recipients: String, body: String },
}

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<GatewayState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Drive one connection.
///
/// A forwarding task writes broadcast payloads and local acknowledgements
/// to the socket; the read loop handles client frames until close. If the
/// broadcaster drops this subscriber, the socket is closed.
async fn handle_socket(socket: WebSocket, state: GatewayState) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (guard, events) = state.relay.broadcaster().subscribe().into_parts();
    let ws_id = guard.id();
    let (reply_tx, reply_rx) = mpsc::channel::<String>(8);
    tracing::debug!(subscriber = %ws_id, "websocket client connected");

    let mut sender_task = tokio::spawn(forward_frames(ws_sender, events, reply_rx));

    loop {
        tokio::select! {
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let reply = handle_frame(&state, text.as_str());
                    if reply_tx.send(reply).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = &mut sender_task => {
                tracing::debug!(subscriber = %ws_id, "live updates ended, closing websocket");
                break;
            }
        }
    }

    drop(guard);
    sender_task.abort();
    tracing::debug!(subscriber = %ws_id, "websocket client disconnected");
}

/// Write events and replies to `sink` until the event stream ends or the
/// sink fails. A closed event stream sends a close frame.
async fn forward_frames<S>(
    mut sink: S,
    mut events: mpsc::Receiver<String>,
    mut replies: mpsc::Receiver<String>,
) where
    S: Sink<Message> + Unpin,
{
    loop {
        let frame = tokio::select! {
            event = events.recv() => match event {
                Some(payload) => payload,
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    return;
                }
            },
            Some(reply) = replies.recv() => reply,
        };
        if sink.send(Message::Text(frame.into())).await.is_err() {
            return;
        }
    }
}

/// Handle a single client frame, returning the JSON reply.
fn handle_frame(state: &GatewayState, text: &str) -> String {
    let reply = match serde_json::from_str::<WsIncoming>(text) {
        Ok(WsIncoming::Send { recipients, body }) => {
            if recipients.trim().is_empty() || body.trim().is_empty() {
                serde_json::json!({"type": "error", "error": "recipients and body are required"})
            } else {
                match state.relay.send_message(&recipients, &body) {
                    Ok(pending) => serde_json::json!({"type": "send_queued", "send_id": pending.id}),
                    Err(e) => serde_json::json!({"type": "error", "error": e.to_string()}),
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "invalid WebSocket frame");
            serde_json::json!({"type": "error", "error": "unrecognized frame"})
        }
    };
    reply.to_string()
}

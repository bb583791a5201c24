// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events stream of live updates (GET /v1/events).
//!
//! Each broadcast payload becomes one `data:` event; the event name is the
//! payload's `type` tag (`conversations`, `message_sent`, `send_failed`).
//! The subscription is removed when the client disconnects and the stream
//! is dropped.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};

use crate::server::GatewayState;

/// Pull the `type` tag out of a serialized live event.
pub fn event_name(payload: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(payload)
        .ok()?
        .get("type")?
        .as_str()
        .map(str::to_string)
}

pub async fn stream_events(
    State(state): State<GatewayState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.relay.broadcaster().subscribe();
    tracing::debug!(subscriber = %subscription.id(), "sse client connected");

    let events = stream::unfold(subscription, |mut subscription| async move {
        let payload = subscription.recv().await?;
        let mut event = Event::default();
        if let Some(name) = event_name(&payload) {
            event = event.event(name);
        }
        Some((Ok(event.data(payload)), subscription))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_name_reads_type_tag() {
        assert_eq!(
            event_name(r#"{"type":"conversations","conversations":[]}"#).as_deref(),
            Some("conversations")
        );
        assert_eq!(event_name("not json"), None);
        assert_eq!(event_name(r#"{"kind":"x"}"#), None);
    }
}

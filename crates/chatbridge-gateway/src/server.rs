// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::time::Instant;

use axum::{middleware as axum_middleware, routing::get, routing::post, Router};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use chatbridge_config::model::ServerConfig;
use chatbridge_core::BridgeError;
use chatbridge_relay::Relay;

use crate::auth::{auth_middleware, AuthConfig};
use crate::{handlers, sse, ws};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub relay: Relay,
    pub auth: AuthConfig,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(relay: Relay, auth: AuthConfig) -> Self {
        Self {
            relay,
            auth,
            start_time: Instant::now(),
        }
    }
}

/// Build the full router.
///
/// - GET /health (public)
/// - GET /v1/conversations
/// - GET /v1/conversations/{chat_id}/messages
/// - GET /v1/attachments/{id}, GET /v1/attachments/{id}/file
/// - POST /v1/messages
/// - GET /v1/events (SSE), GET /ws (WebSocket)
pub fn router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/conversations", get(handlers::list_conversations))
        .route(
            "/v1/conversations/{chat_id}/messages",
            get(handlers::list_messages),
        )
        .route("/v1/attachments/{id}", get(handlers::get_attachment))
        .route("/v1/attachments/{id}/file", get(handlers::get_attachment_file))
        .route("/v1/messages", post(handlers::post_message))
        .route("/v1/events", get(sse::stream_events))
        .route("/ws", get(ws::ws_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until `cancel` fires.
pub async fn serve(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), BridgeError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BridgeError::Gateway {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| BridgeError::Gateway {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server stopped");
    Ok(())
}

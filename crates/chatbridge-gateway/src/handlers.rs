// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Every read handler is a thin call into the relay's assembler; nothing is
//! cached at this layer.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use chatbridge_core::types::{AttachmentMeta, ConversationView, MessageView, PendingSend};

use crate::server::GatewayState;

/// Default page size for message listings.
pub const DEFAULT_MESSAGE_LIMIT: usize = 25;

/// Largest page size a client may request.
pub const MAX_MESSAGE_LIMIT: usize = 500;

/// Query string for GET /v1/conversations/{chat_id}/messages.
#[derive(Debug, Default, Deserialize)]
pub struct MessagesQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

impl MessagesQuery {
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_MESSAGE_LIMIT)
            .min(MAX_MESSAGE_LIMIT)
    }
}

/// Request body for POST /v1/messages.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    /// Comma-joined recipient identifiers.
    pub recipients: String,
    pub body: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Timestamp of the newest store row the poll loop has seen.
    pub watermark: i64,
    /// Outbound sends queued or in flight.
    pub queue_depth: usize,
    pub subscribers: usize,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler failures, rendered as a status code plus JSON body.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(e) => (StatusCode::BAD_REQUEST, e),
            ApiError::NotFound(e) => (StatusCode::NOT_FOUND, e),
            ApiError::Unavailable(e) => (StatusCode::SERVICE_UNAVAILABLE, e),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// GET /health
///
/// Unauthenticated liveness probe.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        watermark: state.relay.watermark(),
        queue_depth: state.relay.queue_depth(),
        subscribers: state.relay.broadcaster().subscriber_count(),
    })
}

/// GET /v1/conversations
pub async fn list_conversations(
    State(state): State<GatewayState>,
) -> Json<Vec<ConversationView>> {
    Json(state.relay.assembler().list_conversations().await)
}

/// GET /v1/conversations/{chat_id}/messages?limit=N
pub async fn list_messages(
    State(state): State<GatewayState>,
    Path(chat_id): Path<i64>,
    Query(query): Query<MessagesQuery>,
) -> Json<Vec<MessageView>> {
    let limit = query.effective_limit();
    Json(state.relay.assembler().list_messages(chat_id, limit).await)
}

/// GET /v1/attachments/{id}
pub async fn get_attachment(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
) -> Result<Json<AttachmentMeta>, ApiError> {
    state
        .relay
        .assembler()
        .get_attachment(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("attachment {id} not found")))
}

/// GET /v1/attachments/{id}/file
///
/// Streams the attachment bytes with the stored MIME type.
pub async fn get_attachment_file(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let meta = state
        .relay
        .assembler()
        .get_attachment(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("attachment {id} not found")))?;
    let filename = meta
        .filename
        .as_deref()
        .ok_or_else(|| ApiError::NotFound(format!("attachment {id} has no file")))?;

    let path = chatbridge_store::expand_home(filename);
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        tracing::warn!(attachment_id = id, path = %path, error = %e, "attachment file unreadable");
        ApiError::NotFound(format!("attachment {id} file unavailable"))
    })?;

    let mime = meta
        .mime_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    Ok(([(header::CONTENT_TYPE, mime)], bytes).into_response())
}

/// POST /v1/messages
///
/// Enqueues an outbound send and returns immediately with its id. Delivery
/// is reported later on the live event stream.
pub async fn post_message(
    State(state): State<GatewayState>,
    Json(request): Json<SendRequest>,
) -> Result<(StatusCode, Json<PendingSend>), ApiError> {
    if request.recipients.trim().is_empty() {
        return Err(ApiError::BadRequest("recipients must not be empty".into()));
    }
    if request.body.trim().is_empty() {
        return Err(ApiError::BadRequest("body must not be empty".into()));
    }

    let pending = state
        .relay
        .send_message(&request.recipients, &request.body)
        .map_err(|e| ApiError::Unavailable(e.to_string()))?;
    tracing::info!(send_id = %pending.id, "outbound message accepted");
    Ok((StatusCode::ACCEPTED, Json(pending)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_caps() {
        assert_eq!(MessagesQuery::default().effective_limit(), 25);
        assert_eq!(MessagesQuery { limit: Some(3) }.effective_limit(), 3);
        assert_eq!(MessagesQuery { limit: Some(10_000) }.effective_limit(), 500);
    }

    #[test]
    fn send_request_requires_both_fields() {
        let ok: Result<SendRequest, _> =
            serde_json::from_str(r#"{"recipients": "a@example.com", "body": "hi"}"#);
        assert!(ok.is_ok());
        let missing: Result<SendRequest, _> = serde_json::from_str(r#"{"body": "hi"}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn error_response_serializes() {
        let json = serde_json::to_string(&ErrorResponse {
            error: "something went wrong".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"error":"something went wrong"}"#);
    }
}

// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared-secret authentication middleware for the gateway.
//!
//! Accepts the token from either source, checked in order:
//! 1. `Authorization: Bearer <token>` header
//! 2. `?token=<token>` query parameter (browsers cannot set headers on
//!    `EventSource` or WebSocket handshakes)
//!
//! When no token is configured, all requests are rejected (fail-closed).

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

/// Authentication configuration for the gateway.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected shared secret. `None` rejects everything.
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl AuthConfig {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// Check a presented token against the configured secret.
    pub fn accepts(&self, presented: &str) -> bool {
        match &self.token {
            Some(expected) => constant_time_eq(expected.as_bytes(), presented.as_bytes()),
            None => false,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn query_token(request: &Request) -> Option<String> {
    let query = request.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find_map(|(k, v)| (k == "token").then(|| v.into_owned()))
}

/// Middleware that validates the shared secret from header or query.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth.token.is_none() {
        tracing::error!("gateway has no auth token configured -- rejecting request");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let accepted = match bearer_token(&request) {
        Some(token) => auth.accepts(token),
        None => query_token(&request).is_some_and(|token| auth.accepts(&token)),
    };

    if accepted {
        Ok(next.run(request).await)
    } else {
        tracing::debug!(path = %request.uri().path(), "request rejected: bad or missing token");
        Err(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let config = AuthConfig::new(Some("secret-token".to_string()));
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("secret-token"));
        assert!(debug_output.contains("[redacted]"));
    }

    #[test]
    fn no_token_accepts_nothing() {
        let config = AuthConfig::new(None);
        assert!(!config.accepts(""));
        assert!(!config.accepts("anything"));
    }

    #[test]
    fn accepts_only_exact_token() {
        let config = AuthConfig::new(Some("s3cret".to_string()));
        assert!(config.accepts("s3cret"));
        assert!(!config.accepts("s3cre"));
        assert!(!config.accepts("s3cret "));
    }

    #[test]
    fn query_token_is_percent_decoded() {
        let request = Request::builder()
            .uri("/v1/events?limit=3&token=a%2Bb")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(query_token(&request).as_deref(), Some("a+b"));
    }
}

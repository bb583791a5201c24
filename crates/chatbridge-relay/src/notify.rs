// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound notification delivery.
//!
//! [`WebhookNotifier`] posts `{title, body, context}` JSON to a configured
//! URL. [`LogNotifier`] only logs, and is used when no webhook is set.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use chatbridge_config::model::NotifyConfig;
use chatbridge_core::{AdapterType, BridgeError, HealthStatus, Notifier, PluginAdapter};

#[derive(Debug, Serialize)]
struct NotificationPayload<'a> {
    title: &'a str,
    body: &'a str,
    context: &'a str,
}

/// Posts notifications to an HTTP endpoint.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Notify {
                message: format!("failed to build webhook client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Notifier
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        Ok(match reqwest::Url::parse(&self.url) {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(format!("invalid webhook url: {e}")),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, title: &str, body: &str, context: &str) -> Result<(), BridgeError> {
        let payload = NotificationPayload {
            title,
            body,
            context,
        };
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| BridgeError::Notify {
                message: format!("webhook request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Notify {
                message: format!("webhook returned {status}"),
                source: None,
            });
        }
        debug!(%status, "notification delivered");
        Ok(())
    }
}

/// Writes notifications to the log and nowhere else.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl PluginAdapter for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Notifier
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, body: &str, context: &str) -> Result<(), BridgeError> {
        info!(title, body, context, "notification");
        Ok(())
    }
}

/// Pick the notifier named by configuration.
pub fn from_config(config: &NotifyConfig) -> Result<Arc<dyn Notifier>, BridgeError> {
    Ok(match &config.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(
            url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?),
        None => Arc::new(LogNotifier),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn webhook_posts_json_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(serde_json::json!({
                "title": "Alice",
                "body": "lunch?",
                "context": "%2B15550001",
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            WebhookNotifier::new(format!("{}/hook", server.uri()), Duration::from_secs(2)).unwrap();
        notifier.notify("Alice", "lunch?", "%2B15550001").await.unwrap();
    }

    #[tokio::test]
    async fn webhook_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(server.uri(), Duration::from_secs(2)).unwrap();
        let err = notifier.notify("t", "b", "c").await.unwrap_err();
        assert!(matches!(err, BridgeError::Notify { .. }));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn from_config_defaults_to_log_notifier() {
        let notifier = from_config(&NotifyConfig::default()).unwrap();
        assert_eq!(notifier.name(), "log");
        assert!(notifier.notify("t", "b", "c").await.is_ok());

        let webhook = from_config(&NotifyConfig {
            webhook_url: Some("http://127.0.0.1:9/hook".into()),
            timeout_secs: 1,
        })
        .unwrap();
        assert_eq!(webhook.name(), "webhook");
    }
}

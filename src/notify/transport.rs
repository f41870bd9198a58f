//! Messaging provider client for outgoing notifications.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::config::ServerConfig;

/// Transport error types.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("dispatch timed out after {0:?}")]
    Timeout(Duration),
}

/// Message content shared by every recipient of one event.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub crime_type: String,
    pub body: String,
}

impl OutgoingMessage {
    /// Build the message body from the caller's summary, or generate the
    /// default warning text when none was supplied.
    pub fn new(crime_type: &str, summary: Option<&str>) -> Self {
        let body = match summary {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => format!(
                "A crime has been detected in your area: {}. Please refer to local authorities for more information.",
                crime_type
            ),
        };

        Self {
            crime_type: crime_type.to_string(),
            body,
        }
    }
}

/// A provider capable of delivering one notification to one recipient.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, to: &str, message: &OutgoingMessage) -> Result<(), TransportError>;
}

/// EmailJS-style REST transport.
///
/// Posts one template render per recipient to the provider's send endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    api_url: String,
    service_id: String,
    template_id: String,
    user_id: String,
    private_key: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn from_config(cfg: &ServerConfig) -> Result<Self, TransportError> {
        let timeout = cfg.dispatch_timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_url: cfg.email_api_url.clone(),
            service_id: cfg.email_service_id.clone(),
            template_id: cfg.email_template_id.clone(),
            user_id: cfg.email_user_id.clone(),
            private_key: cfg.email_private_key.clone(),
            timeout,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, to: &str, message: &OutgoingMessage) -> Result<(), TransportError> {
        // Timestamp is generated here, at dispatch time
        let payload = json!({
            "service_id": self.service_id,
            "template_id": self.template_id,
            "user_id": self.user_id,
            "accessToken": self.private_key,
            "template_params": {
                "to": to,
                "time": Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                "crime_type": message.crime_type,
                "message": message.body,
            },
        });

        let response = self
            .client
            .post(&self.api_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(self.timeout)
                } else {
                    TransportError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

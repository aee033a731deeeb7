//! Mail-relay client
//!
//! Dispatches composed messages through the internal HTTP mail relay.
//! SMTP mechanics live behind the relay, not here.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Mail relay errors
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Mail relay error {0}: {1}")]
    Relay(u16, String),
}

/// One outbound message, as the relay accepts it.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    pub subject: String,
    pub body: String,
}

pub struct MailClient {
    http: reqwest::Client,
    relay_url: String,
}

impl MailClient {
    pub fn new(relay_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            relay_url: relay_url.to_string(),
        }
    }

    pub async fn send(&self, message: &OutboundMessage) -> Result<(), MailError> {
        let response = self
            .http
            .post(&self.relay_url)
            .json(message)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| MailError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Relay(status.as_u16(), body));
        }
        Ok(())
    }
}

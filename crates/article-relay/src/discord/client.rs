//! Webhook delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use super::payload::DiscordMessage;

/// Errors from a single delivery attempt.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Discord answered with a non-success status.
    #[error("webhook rejected message (status {status}): {body}")]
    Rejected { status: u16, body: String },

    /// The request never completed (connect, DNS, timeout, ...).
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Destination for Discord messages.
///
/// Implementations make exactly one attempt and never retry; callers decide
/// what a failure means for them.
#[async_trait]
pub trait Webhook: Send + Sync {
    async fn deliver(&self, payload: &DiscordMessage) -> Result<(), DeliveryError>;
}

/// Discord webhook reached over HTTP.
pub struct WebhookClient {
    client: Client,
    url: String,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Webhook for WebhookClient {
    async fn deliver(&self, payload: &DiscordMessage) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected { status, body });
        }

        Ok(())
    }
}

//! Build-and-deliver pipeline shared by the HTTP and queue paths.

use std::sync::Arc;

use tracing::{debug, info};

use crate::article::ArticleMetadata;
use crate::discord::{DeliveryError, DiscordMessage, Webhook};

/// Announces articles on the configured webhook.
#[derive(Clone)]
pub struct Relay {
    webhook: Arc<dyn Webhook>,
}

impl Relay {
    pub fn new(webhook: Arc<dyn Webhook>) -> Self {
        Self { webhook }
    }

    /// Build the Discord message for `meta` and make one delivery attempt.
    pub async fn announce(&self, meta: &ArticleMetadata) -> Result<(), DeliveryError> {
        let payload = DiscordMessage::from_article(meta);
        debug!(
            title = meta.title(),
            url = meta.url(),
            "Sending article to Discord"
        );

        self.webhook.deliver(&payload).await?;

        info!(url = meta.url(), "Article announced on Discord");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{accepting, rejecting};
    use super::*;
    use serde_json::json;

    fn article() -> ArticleMetadata {
        ArticleMetadata::from_value(json!({
            "title": "Relay",
            "url": "https://calpa.me/relay",
            "description": "desc",
            "timestamp": "2025-01-01T00:00:00Z",
            "thumbnailURL": "https://calpa.me/relay.png"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_announce_sends_built_payload() {
        let webhook = Arc::new(accepting());
        let relay = Relay::new(webhook.clone());

        relay.announce(&article()).await.unwrap();

        let sent = webhook.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], DiscordMessage::from_article(&article()));
    }

    #[tokio::test]
    async fn test_announce_reports_rejection() {
        let relay = Relay::new(Arc::new(rejecting(500)));
        let err = relay.announce(&article()).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Rejected { status: 500, .. }));
    }
}

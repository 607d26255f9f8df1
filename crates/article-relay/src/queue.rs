//! Queue batch processing.
//!
//! The host queue hands over a batch of messages and gets back one
//! [`Disposition`] per message. Messages are processed concurrently and in
//! isolation: each runs in its own task, so a slow, failing or panicking
//! message never changes another message's outcome.
//!
//! Per message:
//!
//! ```text
//!  body.token != secret ──────────────▶ Ack   (a bad token never heals)
//!  envelope invalid ──────────────────▶ Retry
//!  webhook rejected / unreachable ────▶ Retry
//!  task panicked ─────────────────────▶ Retry
//!  delivered ─────────────────────────▶ Ack
//! ```
//!
//! Retry limits, backoff and dead-lettering are the host queue's business.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::article::QueueEnvelope;
use crate::auth::SharedSecret;
use crate::discord::DeliveryError;
use crate::relay::Relay;

/// One dequeued message as seen by the host adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueMessage {
    pub id: String,
    pub body: Value,
    /// Delivery count reported by the queue, for diagnostics only.
    #[serde(default = "first_attempt")]
    pub attempts: u32,
}

fn first_attempt() -> u32 {
    1
}

impl QueueMessage {
    pub fn new(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            body,
            attempts: first_attempt(),
        }
    }
}

/// What the host queue should do with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Processed (or permanently undeliverable); remove from the queue.
    Ack,
    /// Redeliver later.
    Retry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageOutcome {
    pub id: String,
    pub disposition: Disposition,
}

#[derive(Clone)]
pub struct QueueHandler {
    relay: Relay,
    secret: SharedSecret,
}

impl QueueHandler {
    pub fn new(relay: Relay, secret: SharedSecret) -> Self {
        Self { relay, secret }
    }

    /// Process every message concurrently; outcomes come back in input order.
    pub async fn process_batch(&self, messages: Vec<QueueMessage>) -> Vec<MessageOutcome> {
        info!(size = messages.len(), "Processing queue batch");

        let (ids, tasks): (Vec<_>, Vec<_>) = messages
            .into_iter()
            .map(|message| {
                let handler = self.clone();
                let id = message.id.clone();
                let task = tokio::spawn(async move { handler.process_message(message).await });
                (id, task)
            })
            .unzip();

        ids.into_iter()
            .zip(join_all(tasks).await)
            .map(|(id, joined)| {
                let disposition = joined.unwrap_or_else(|e| {
                    error!(message_id = %id, error = %e, "Queue message task failed");
                    Disposition::Retry
                });
                MessageOutcome { id, disposition }
            })
            .collect()
    }

    /// Decide the fate of a single message.
    pub async fn process_message(&self, message: QueueMessage) -> Disposition {
        let QueueMessage { id, body, attempts } = message;
        debug!(message_id = %id, attempts, "Received queue message");

        let authorized = body
            .get("token")
            .and_then(Value::as_str)
            .is_some_and(|token| self.secret.matches(token));
        if !authorized {
            warn!(message_id = %id, "Dropping queue message with invalid token");
            return Disposition::Ack;
        }

        let envelope = match QueueEnvelope::from_value(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(message_id = %id, error = %e, "Invalid queue message, will retry");
                return Disposition::Retry;
            }
        };

        match self.relay.announce(envelope.content()).await {
            Ok(()) => Disposition::Ack,
            Err(e @ DeliveryError::Rejected { .. }) => {
                error!(
                    message_id = %id,
                    error = %e,
                    "Discord rejected queue message, will retry"
                );
                Disposition::Retry
            }
            Err(e @ DeliveryError::Transport(_)) => {
                error!(
                    message_id = %id,
                    error = %e,
                    "Error sending queue message to Discord, will retry"
                );
                Disposition::Retry
            }
        }
    }
}

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::models::MatchEvent;

/// Errors that can occur when publishing lifecycle events
#[derive(Debug, Error)]
pub enum EventError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Webhook returned error: {0}")]
    Webhook(String),
}

/// Publisher for match lifecycle events
///
/// Delivers match.created / match.mutual / match.expired to the
/// notification webhook. Delivery is best-effort from the request path:
/// callers log failures rather than failing the swipe, and the mutual
/// event is additionally gated by the store-side idempotency claim so
/// the conversation is never created twice for one pair.
pub struct EventPublisher {
    client: Client,
    webhook_url: Option<String>,
}

impl EventPublisher {
    pub fn new(webhook_url: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            webhook_url,
        }
    }

    /// Disabled publisher for deployments without a notification service
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub async fn publish(&self, event: &MatchEvent) -> Result<(), EventError> {
        let Some(url) = &self.webhook_url else {
            tracing::trace!("Event publishing disabled, dropping {:?}", event.event);
            return Ok(());
        };

        let response = self.client.post(url).json(event).send().await?;

        if !response.status().is_success() {
            return Err(EventError::Webhook(format!(
                "Failed to publish {:?}: {}",
                event.event,
                response.status()
            )));
        }

        tracing::debug!(
            "Published {:?} for match {} ({} -> {})",
            event.event,
            event.match_id,
            event.user_id,
            event.target_id
        );
        Ok(())
    }
}

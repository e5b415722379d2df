use async_trait::async_trait;

use super::RepositoryError;
use crate::models::webhook_event::WebhookEventLog;

#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// True once an event id has been stamped by [`mark_processed`].
    ///
    /// [`mark_processed`]: WebhookEventRepository::mark_processed
    async fn has_processed_event(&self, event_id: &str) -> Result<bool, RepositoryError>;

    /// Records a delivery. Redeliveries of the same event id bump
    /// `delivery_count` instead of inserting a second document.
    async fn log_event(&self, entry: &WebhookEventLog) -> Result<(), RepositoryError>;

    async fn mark_processed(&self, event_id: &str, outcome: &str) -> Result<(), RepositoryError>;
}

use async_trait::async_trait;
use mongodb::bson::{self, doc, DateTime, Document};
use mongodb::{Collection, Database};

use super::webhook_event_repository::WebhookEventRepository;
use super::RepositoryError;
use crate::models::webhook_event::{WebhookEventLog, WEBHOOK_EVENTS_COLLECTION};

pub struct MongoWebhookEventRepository {
    events: Collection<Document>,
}

impl MongoWebhookEventRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            events: db.collection(WEBHOOK_EVENTS_COLLECTION),
        }
    }
}

#[async_trait]
impl WebhookEventRepository for MongoWebhookEventRepository {
    async fn has_processed_event(&self, event_id: &str) -> Result<bool, RepositoryError> {
        let found = self
            .events
            .find_one(doc! {
                "event_id": event_id,
                "processed_at": { "$type": "date" },
            })
            .await?;
        Ok(found.is_some())
    }

    async fn log_event(&self, entry: &WebhookEventLog) -> Result<(), RepositoryError> {
        let payload = bson::to_bson(&entry.payload)?;
        self.events
            .update_one(
                doc! { "event_id": entry.event_id.as_str() },
                doc! {
                    "$setOnInsert": {
                        "event_type": entry.event_type.as_str(),
                        "created": entry.created,
                        "payload": payload,
                        "received_at": entry.received_at,
                    },
                    "$set": { "last_received_at": DateTime::now() },
                    "$inc": { "delivery_count": 1 },
                },
            )
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn mark_processed(&self, event_id: &str, outcome: &str) -> Result<(), RepositoryError> {
        self.events
            .update_one(
                doc! { "event_id": event_id },
                doc! { "$set": {
                    "processed_at": DateTime::now(),
                    "outcome": outcome,
                }},
            )
            .await?;
        Ok(())
    }
}

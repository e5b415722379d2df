use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::services::stripe::StripeEvent;

pub const WEBHOOK_EVENTS_COLLECTION: &str = "webhook_events";

/// Audit record of a Stripe delivery. One document per Stripe event id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEventLog {
    pub event_id: String,
    pub event_type: String,
    /// Unix timestamp (seconds) Stripe reports for the event
    #[serde(default)]
    pub created: Option<i64>,
    pub payload: serde_json::Value,
    pub received_at: DateTime,
    #[serde(default)]
    pub delivery_count: i32,
    #[serde(default)]
    pub processed_at: Option<DateTime>,
    #[serde(default)]
    pub outcome: Option<String>,
}

impl WebhookEventLog {
    pub fn from_event(event: &StripeEvent) -> Self {
        Self {
            event_id: event.id.clone(),
            event_type: event.r#type.clone(),
            created: event.created,
            payload: event.payload.clone(),
            received_at: DateTime::now(),
            delivery_count: 1,
            processed_at: None,
            outcome: None,
        }
    }
}

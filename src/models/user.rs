use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::db::repository::Entity;

pub const USERS_COLLECTION: &str = "users";

/// Subscription snapshot mirrored from the latest `customer.subscription.*` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionState {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    /// Unix timestamp (seconds) when the current period ends
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub onboarding_completed: bool,
    #[serde(default)]
    pub has_workspace: bool,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub selected_bundles: Vec<String>,
    #[serde(default)]
    pub stripe_customer_id: Option<String>,
    #[serde(default)]
    pub last_payment_intent_id: Option<String>,
    #[serde(default)]
    pub subscription: Option<SubscriptionState>,
    #[serde(default)]
    pub billing_error: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime>,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            onboarding_completed: false,
            has_workspace: false,
            workspace_id: None,
            selected_bundles: Vec::new(),
            stripe_customer_id: None,
            last_payment_intent_id: None,
            subscription: None,
            billing_error: None,
            updated_at: None,
        }
    }
}

impl Entity for User {
    const COLLECTION: &'static str = USERS_COLLECTION;
}

/// Fields written in one shot when a payment completes onboarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingUpdate {
    pub workspace_id: String,
    pub selected_bundles: Vec<String>,
    pub payment_intent_id: String,
}

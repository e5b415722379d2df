// NOTE: async-stripe is compiled with only the runtime-tokio-hyper feature. Customers and
// PaymentIntents are core resources; touching feature-gated APIs (billing, checkout, connect)
// requires updating Cargo.toml explicitly.
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::payment::PaymentIntentStatus;

pub mod signature;

use signature::SignatureError;

#[derive(Debug, thiserror::Error)]
pub enum StripeServiceError {
    #[error("stripe api error: {0}")]
    Api(String),
    #[error("webhook verification failed: {0}")]
    Webhook(String),
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("serialization error: {0}")]
    Serde(String),
}

impl From<stripe::StripeError> for StripeServiceError {
    fn from(err: stripe::StripeError) -> Self {
        StripeServiceError::Api(err.to_string())
    }
}

impl From<SignatureError> for StripeServiceError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidPayload(msg) => StripeServiceError::InvalidPayload(msg),
            SignatureError::Verification(msg) => StripeServiceError::Webhook(msg),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    pub r#type: String,
    /// Unix timestamp (seconds) Stripe stamped on the event
    pub created: Option<i64>,
    pub payload: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub id: String,
    pub email: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePaymentIntentRequest {
    /// Minor currency units
    pub amount: i64,
    pub currency: String,
    pub customer: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentIntentInfo {
    pub id: String,
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentIntentStatus,
}

#[async_trait]
pub trait StripeService: Send + Sync {
    /// Creates a customer tagged with `metadata.user_id`.
    async fn create_customer(&self, email: &str, user_id: &str)
        -> Result<String, StripeServiceError>;

    async fn retrieve_customer(&self, customer_id: &str)
        -> Result<CustomerInfo, StripeServiceError>;

    async fn create_payment_intent(
        &self,
        req: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntentInfo, StripeServiceError>;

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, StripeServiceError>;
}

mod live;
#[cfg(test)]
mod mock;

pub use live::LiveStripeService;
#[cfg(test)]
pub use mock::MockStripeService;

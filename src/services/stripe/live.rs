use std::collections::{BTreeMap, HashMap};

use super::{
    signature, CreatePaymentIntentRequest, CustomerInfo, PaymentIntentInfo, StripeEvent,
    StripeService, StripeServiceError,
};
use crate::models::payment::{PaymentIntentStatus, METADATA_USER_ID};
use async_trait::async_trait;

pub struct LiveStripeService {
    client: stripe::Client,
    webhook_secret: String,
}

impl LiveStripeService {
    pub fn new(secret_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        let client = stripe::Client::new(secret_key);
        Self {
            client,
            webhook_secret: webhook_secret.into(),
        }
    }

    pub fn from_settings(settings: &crate::config::StripeSettings) -> Self {
        Self::new(settings.secret_key.clone(), settings.webhook_secret.clone())
    }
}

fn parse_customer_id(customer_id: &str) -> Result<stripe::CustomerId, StripeServiceError> {
    customer_id
        .parse::<stripe::CustomerId>()
        .map_err(|e| StripeServiceError::InvalidRequest(e.to_string()))
}

// Currency deserializes from its lowercase ISO code.
fn parse_currency(code: &str) -> Result<stripe::Currency, StripeServiceError> {
    serde_json::from_value(serde_json::Value::String(code.to_string()))
        .map_err(|_| StripeServiceError::InvalidRequest(format!("unsupported currency {code}")))
}

#[async_trait]
impl StripeService for LiveStripeService {
    async fn create_customer(
        &self,
        email: &str,
        user_id: &str,
    ) -> Result<String, StripeServiceError> {
        let mut params = stripe::CreateCustomer::new();
        params.email = Some(email);
        params.metadata = Some(HashMap::from([(
            METADATA_USER_ID.to_string(),
            user_id.to_string(),
        )]));
        let customer = stripe::Customer::create(&self.client, params).await?;
        Ok(customer.id.to_string())
    }

    async fn retrieve_customer(
        &self,
        customer_id: &str,
    ) -> Result<CustomerInfo, StripeServiceError> {
        let cid = parse_customer_id(customer_id)?;
        let customer = stripe::Customer::retrieve(&self.client, &cid, &[]).await?;
        let value = serde_json::to_value(&customer)
            .map_err(|e| StripeServiceError::Serde(e.to_string()))?;

        if value.get("deleted").and_then(|v| v.as_bool()) == Some(true) {
            return Err(StripeServiceError::NotFound(format!(
                "customer {customer_id} was deleted"
            )));
        }

        let metadata = value
            .get("metadata")
            .cloned()
            .and_then(|m| serde_json::from_value::<BTreeMap<String, String>>(m).ok())
            .unwrap_or_default();
        let email = value
            .get("email")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        Ok(CustomerInfo {
            id: customer.id.to_string(),
            email,
            metadata,
        })
    }

    async fn create_payment_intent(
        &self,
        req: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntentInfo, StripeServiceError> {
        let currency = parse_currency(&req.currency)?;
        let mut params = stripe::CreatePaymentIntent::new(req.amount, currency);
        if let Some(ref customer) = req.customer {
            params.customer = Some(parse_customer_id(customer)?);
        }
        if !req.metadata.is_empty() {
            params.metadata = Some(req.metadata.clone().into_iter().collect());
        }

        let intent = stripe::PaymentIntent::create(&self.client, params).await?;
        Ok(PaymentIntentInfo {
            id: intent.id.to_string(),
            client_secret: intent.client_secret.clone(),
            amount: intent.amount,
            currency: intent.currency.to_string(),
            status: PaymentIntentStatus::parse(&intent.status.to_string()),
        })
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, StripeServiceError> {
        let event = signature::construct_event(
            payload,
            signature_header,
            &self.webhook_secret,
            signature::unix_now(),
        )?;
        Ok(event)
    }
}

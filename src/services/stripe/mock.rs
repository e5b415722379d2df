use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use super::{
    signature, CreatePaymentIntentRequest, CustomerInfo, PaymentIntentInfo, StripeEvent,
    StripeService, StripeServiceError,
};
use crate::models::payment::{PaymentIntentStatus, METADATA_USER_ID};
use async_trait::async_trait;

pub const MOCK_WEBHOOK_SECRET: &str = "whsec_mock_secret";

#[derive(Clone)]
pub struct MockStripeService {
    pub webhook_secret: String,
    pub customers: Arc<Mutex<HashMap<String, CustomerInfo>>>,
    pub created_customers: Arc<Mutex<Vec<(String, String)>>>,
    pub payment_intent_requests: Arc<Mutex<Vec<CreatePaymentIntentRequest>>>,
    pub customer_lookups: Arc<Mutex<usize>>,
    pub fail_api: bool,
}

impl Default for MockStripeService {
    fn default() -> Self {
        Self {
            webhook_secret: MOCK_WEBHOOK_SECRET.to_string(),
            customers: Arc::default(),
            created_customers: Arc::default(),
            payment_intent_requests: Arc::default(),
            customer_lookups: Arc::default(),
            fail_api: false,
        }
    }
}

impl MockStripeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a customer whose metadata carries `user_id` when given.
    pub fn with_customer(self, customer_id: &str, user_id: Option<&str>) -> Self {
        let metadata: BTreeMap<String, String> = user_id
            .map(|uid| [(METADATA_USER_ID.to_string(), uid.to_string())].into())
            .unwrap_or_default();
        self.customers.lock().unwrap().insert(
            customer_id.to_string(),
            CustomerInfo {
                id: customer_id.to_string(),
                email: None,
                metadata,
            },
        );
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_api = true;
        self
    }

    /// Signs `payload` with this mock's webhook secret at the current time.
    pub fn sign(&self, payload: &[u8]) -> String {
        signature::signature_header(&self.webhook_secret, signature::unix_now(), payload)
    }
}

fn make_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

#[async_trait]
impl StripeService for MockStripeService {
    async fn create_customer(
        &self,
        email: &str,
        user_id: &str,
    ) -> Result<String, StripeServiceError> {
        if self.fail_api {
            return Err(StripeServiceError::Api("mock stripe outage".into()));
        }
        let id = make_id("cus_test");
        self.created_customers
            .lock()
            .unwrap()
            .push((email.to_string(), user_id.to_string()));
        self.customers.lock().unwrap().insert(
            id.clone(),
            CustomerInfo {
                id: id.clone(),
                email: Some(email.to_string()),
                metadata: [(METADATA_USER_ID.to_string(), user_id.to_string())].into(),
            },
        );
        Ok(id)
    }

    async fn retrieve_customer(
        &self,
        customer_id: &str,
    ) -> Result<CustomerInfo, StripeServiceError> {
        *self.customer_lookups.lock().unwrap() += 1;
        if self.fail_api {
            return Err(StripeServiceError::Api("mock stripe outage".into()));
        }
        self.customers
            .lock()
            .unwrap()
            .get(customer_id)
            .cloned()
            .ok_or_else(|| StripeServiceError::NotFound(format!("customer {customer_id} not found")))
    }

    async fn create_payment_intent(
        &self,
        req: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntentInfo, StripeServiceError> {
        self.payment_intent_requests.lock().unwrap().push(req.clone());
        if self.fail_api {
            return Err(StripeServiceError::Api("mock stripe outage".into()));
        }
        let id = make_id("pi_test");
        Ok(PaymentIntentInfo {
            client_secret: Some(format!("{id}_secret_mock")),
            id,
            amount: req.amount,
            currency: req.currency,
            status: PaymentIntentStatus::RequiresPaymentMethod,
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

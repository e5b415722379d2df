//! Reconciles verified Stripe events against user records.
//!
//! Every handler returns a [`WebhookOutcome`] or a [`BillingError`]. Business
//! errors (unknown customer, missing metadata) are acknowledged to Stripe with
//! a 200; anything else is surfaced so the delivery is retried.

use thiserror::Error;
use tracing::info;

use crate::db::RepositoryError;
use crate::services::stripe::{StripeEvent, StripeServiceError};
use crate::state::AppState;

pub mod onboarding;
pub mod payments;
pub mod referrals;
pub mod subscriptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    PaymentIntentSucceeded,
    PaymentIntentFailed,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    InvoicePaid,
    InvoicePaymentFailed,
}

impl EventKind {
    /// Exact match on the Stripe event type string.
    pub fn from_type(evt_type: &str) -> Option<Self> {
        let kind = match evt_type {
            "payment_intent.succeeded" => EventKind::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => EventKind::PaymentIntentFailed,
            "customer.subscription.created" => EventKind::SubscriptionCreated,
            "customer.subscription.updated" => EventKind::SubscriptionUpdated,
            "customer.subscription.deleted" => EventKind::SubscriptionDeleted,
            "invoice.paid" | "invoice.payment_succeeded" => EventKind::InvoicePaid,
            "invoice.payment_failed" => EventKind::InvoicePaymentFailed,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed(String),
    Ignored(String),
    Unhandled,
}

impl WebhookOutcome {
    /// Short label stored alongside the processed event.
    pub fn as_str(&self) -> &str {
        match self {
            WebhookOutcome::Processed(_) => "processed",
            WebhookOutcome::Ignored(_) => "ignored",
            WebhookOutcome::Unhandled => "unhandled",
        }
    }
}

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("payment intent has no customer")]
    MissingCustomer,
    #[error("customer {0} has no user_id metadata")]
    MissingUserId(String),
    #[error("user {0} not found")]
    UserNotFound(String),
    #[error("malformed event: {0}")]
    MalformedEvent(String),
    #[error(transparent)]
    Stripe(#[from] StripeServiceError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl BillingError {
    /// Business errors are acknowledged; retrying the delivery would not help.
    pub fn is_business(&self) -> bool {
        match self {
            BillingError::MissingCustomer
            | BillingError::MissingUserId(_)
            | BillingError::UserNotFound(_)
            | BillingError::MalformedEvent(_) => true,
            BillingError::Stripe(StripeServiceError::NotFound(_)) => true,
            BillingError::Stripe(_) | BillingError::Repository(_) => false,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            BillingError::MissingCustomer => "missing_customer",
            BillingError::MissingUserId(_) => "missing_user_id",
            BillingError::UserNotFound(_) => "user_not_found",
            BillingError::MalformedEvent(_) => "malformed_event",
            BillingError::Stripe(_) => "stripe_error",
            BillingError::Repository(_) => "repository_error",
        }
    }
}

pub async fn dispatch(
    state: &AppState,
    event: &StripeEvent,
) -> Result<WebhookOutcome, BillingError> {
    let Some(kind) = EventKind::from_type(&event.r#type) else {
        info!(evt_type = %event.r#type, "unhandled stripe event type");
        return Ok(WebhookOutcome::Unhandled);
    };

    let object = data_object(&event.payload)?;
    match kind {
        EventKind::PaymentIntentSucceeded => onboarding::complete_onboarding(state, object).await,
        EventKind::PaymentIntentFailed => payments::record_payment_failure(state, object).await,
        EventKind::SubscriptionCreated | EventKind::SubscriptionUpdated => {
            subscriptions::sync_subscription(state, object).await
        }
        EventKind::SubscriptionDeleted => subscriptions::cancel_subscription(state, object).await,
        EventKind::InvoicePaid => subscriptions::clear_invoice_failure(state, object).await,
        EventKind::InvoicePaymentFailed => {
            subscriptions::record_invoice_failure(state, object).await
        }
    }
}

fn data_object(payload: &serde_json::Value) -> Result<&serde_json::Value, BillingError> {
    jget(payload, &["data", "object"])
        .filter(|obj| obj.is_object())
        .ok_or_else(|| BillingError::MalformedEvent("event has no data.object".into()))
}

/// Maps `object.customer` to a user id through the stored Stripe customer id.
pub(crate) async fn resolve_customer_user(
    state: &AppState,
    object: &serde_json::Value,
) -> Result<Option<String>, BillingError> {
    let Some(customer_id) = extract_str(object, &["customer"]) else {
        return Ok(None);
    };
    Ok(state
        .users
        .find_user_id_by_stripe_customer_id(customer_id)
        .await?)
}

// Small helper: nested json lookup
pub(crate) fn jget<'a>(val: &'a serde_json::Value, path: &[&str]) -> Option<&'a serde_json::Value> {
    let mut cur = val;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

pub(crate) fn extract_str<'a>(val: &'a serde_json::Value, path: &[&str]) -> Option<&'a str> {
    jget(val, path)?.as_str().filter(|s| !s.is_empty())
}

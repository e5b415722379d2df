use serde_json::Value;
use tracing::{info, warn};

use super::{extract_str, jget, resolve_customer_user, BillingError, WebhookOutcome};
use crate::models::user::SubscriptionState;
use crate::state::AppState;

const DEFAULT_INVOICE_FAILURE: &str =
    "Your latest invoice could not be paid. Please update your payment method.";

fn subscription_state(sub: &Value) -> Result<SubscriptionState, BillingError> {
    let id = extract_str(sub, &["id"])
        .ok_or_else(|| BillingError::MalformedEvent("subscription has no id".into()))?;
    Ok(SubscriptionState {
        id: id.to_string(),
        status: extract_str(sub, &["status"]).unwrap_or("unknown").to_string(),
        cancel_at_period_end: jget(sub, &["cancel_at_period_end"])
            .and_then(Value::as_bool)
            .unwrap_or(false),
        current_period_end: jget(sub, &["current_period_end"]).and_then(Value::as_i64),
    })
}

fn unresolved(kind: &str) -> WebhookOutcome {
    warn!(kind, "unable to resolve user for stripe customer");
    WebhookOutcome::Ignored(format!("no user for {kind} customer"))
}

/// `customer.subscription.created` and `customer.subscription.updated`.
pub async fn sync_subscription(
    state: &AppState,
    sub: &Value,
) -> Result<WebhookOutcome, BillingError> {
    let snapshot = subscription_state(sub)?;
    let Some(user_id) = resolve_customer_user(state, sub).await? else {
        return Ok(unresolved("subscription"));
    };

    state.users.update_subscription(&user_id, &snapshot).await?;
    info!(%user_id, subscription = %snapshot.id, status = %snapshot.status, "subscription synced");
    Ok(WebhookOutcome::Processed(format!(
        "subscription {} is {}",
        snapshot.id, snapshot.status
    )))
}

pub async fn cancel_subscription(
    state: &AppState,
    sub: &Value,
) -> Result<WebhookOutcome, BillingError> {
    let mut snapshot = subscription_state(sub)?;
    snapshot.status = "canceled".to_string();
    let Some(user_id) = resolve_customer_user(state, sub).await? else {
        return Ok(unresolved("subscription"));
    };

    state.users.update_subscription(&user_id, &snapshot).await?;
    info!(%user_id, subscription = %snapshot.id, "subscription canceled");
    Ok(WebhookOutcome::Processed(format!(
        "subscription {} canceled",
        snapshot.id
    )))
}

/// `invoice.paid` / `invoice.payment_succeeded` clear a previous failure.
pub async fn clear_invoice_failure(
    state: &AppState,
    invoice: &Value,
) -> Result<WebhookOutcome, BillingError> {
    let Some(user_id) = resolve_customer_user(state, invoice).await? else {
        return Ok(unresolved("invoice"));
    };

    state.users.set_billing_error(&user_id, None).await?;
    Ok(WebhookOutcome::Processed("invoice paid".into()))
}

pub async fn record_invoice_failure(
    state: &AppState,
    invoice: &Value,
) -> Result<WebhookOutcome, BillingError> {
    let Some(user_id) = resolve_customer_user(state, invoice).await? else {
        return Ok(unresolved("invoice"));
    };

    let message = extract_str(invoice, &["last_finalization_error", "message"])
        .unwrap_or(DEFAULT_INVOICE_FAILURE);
    state.users.set_billing_error(&user_id, Some(message)).await?;
    warn!(%user_id, "invoice payment failed");
    Ok(WebhookOutcome::Processed("invoice payment failure recorded".into()))
}

use serde_json::Value;
use tracing::warn;

use super::{extract_str, resolve_customer_user, BillingError, WebhookOutcome};
use crate::state::AppState;

const DEFAULT_PAYMENT_FAILURE: &str = "Payment failed. Please update your card or try again.";

/// `payment_intent.payment_failed`: surfaces the decline reason on the user.
pub async fn record_payment_failure(
    state: &AppState,
    intent: &Value,
) -> Result<WebhookOutcome, BillingError> {
    let Some(user_id) = resolve_customer_user(state, intent).await? else {
        warn!("unable to resolve user for failed payment intent");
        return Ok(WebhookOutcome::Ignored("no user for payment intent customer".into()));
    };

    let message = extract_str(intent, &["last_payment_error", "message"])
        .unwrap_or(DEFAULT_PAYMENT_FAILURE);
    state.users.set_billing_error(&user_id, Some(message)).await?;
    warn!(%user_id, payment_intent = ?extract_str(intent, &["id"]), "payment failed");
    Ok(WebhookOutcome::Processed("payment failure recorded".into()))
}

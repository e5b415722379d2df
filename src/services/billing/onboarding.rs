use serde_json::Value;
use tracing::{info, warn};

use super::{extract_str, jget, referrals, BillingError, WebhookOutcome};
use crate::models::payment::{
    decode_bundles, METADATA_BUNDLES, METADATA_REFERRAL_CODE, METADATA_USER_ID,
    METADATA_WORKSPACE_NAME,
};
use crate::models::user::OnboardingUpdate;
use crate::state::AppState;
use crate::utils::slug::workspace_id;

/// Handles `payment_intent.succeeded`: the user behind the intent's customer
/// gets their workspace and bundles, and any referral is credited.
pub async fn complete_onboarding(
    state: &AppState,
    intent: &Value,
) -> Result<WebhookOutcome, BillingError> {
    let intent_id = extract_str(intent, &["id"])
        .ok_or_else(|| BillingError::MalformedEvent("payment intent has no id".into()))?;
    let customer_id = extract_str(intent, &["customer"]).ok_or(BillingError::MissingCustomer)?;

    let customer = state.stripe.retrieve_customer(customer_id).await?;
    let user_id = customer
        .metadata
        .get(METADATA_USER_ID)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BillingError::MissingUserId(customer_id.to_string()))?
        .to_string();

    let workspace_name =
        extract_str(intent, &["metadata", METADATA_WORKSPACE_NAME]).unwrap_or_default();
    let bundles = extract_str(intent, &["metadata", METADATA_BUNDLES])
        .map(decode_bundles)
        .unwrap_or_default();

    let update = OnboardingUpdate {
        workspace_id: workspace_id(&user_id, workspace_name),
        selected_bundles: bundles,
        payment_intent_id: intent_id.to_string(),
    };

    if !state.users.complete_onboarding(&user_id, &update).await? {
        return Err(BillingError::UserNotFound(user_id));
    }
    info!(
        %user_id,
        workspace_id = %update.workspace_id,
        payment_intent = intent_id,
        "onboarding completed"
    );

    if let Some(code) = extract_str(intent, &["metadata", METADATA_REFERRAL_CODE]) {
        let amount = jget(intent, &["amount_received"])
            .and_then(Value::as_i64)
            .or_else(|| jget(intent, &["amount"]).and_then(Value::as_i64))
            .unwrap_or(0);
        if let Err(err) =
            referrals::accrue_commission(state, code, &user_id, intent_id, amount).await
        {
            warn!(?err, %user_id, referral_code = code, "failed to record referral conversion");
        }
    }

    Ok(WebhookOutcome::Processed(format!(
        "onboarding completed for {user_id}"
    )))
}

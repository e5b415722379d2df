use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    response::Response,
    Json,
};
use tracing::{error, info, warn};

use crate::models::payment::{
    encode_bundles, CreatePaymentIntentPayload, PaymentIntentResponse, METADATA_BUNDLES,
    METADATA_REFERRAL_CODE, METADATA_USER_ID, METADATA_WORKSPACE_NAME,
};
use crate::responses::JsonResponse;
use crate::routes::auth::AuthSession;
use crate::services::stripe::{CreatePaymentIntentRequest, StripeServiceError};
use crate::state::AppState;

// POST /api/payments/create-payment-intent
pub async fn create_payment_intent(
    State(app_state): State<AppState>,
    AuthSession(claims): AuthSession,
    payload: Result<Json<CreatePaymentIntentPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "rejected payment intent body");
            return JsonResponse::bad_request_with_code(&rejection.body_text(), "invalid_body")
                .into_response();
        }
    };
    let request = match payload.validate() {
        Ok(r) => r,
        Err(err) => {
            return JsonResponse::bad_request_with_code(&err.to_string(), err.code())
                .into_response()
        }
    };
    let user_id = claims.id.as_str();

    let user = match app_state.users.find_user_by_id(user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => return JsonResponse::not_found("User not found").into_response(),
        Err(err) => {
            error!(?err, %user_id, "failed to load user for payment intent");
            return JsonResponse::server_error("Failed to create payment intent").into_response();
        }
    };

    let customer_id = match user.stripe_customer_id.clone() {
        Some(id) => id,
        None => {
            let id = match app_state.stripe.create_customer(&user.email, user_id).await {
                Ok(id) => id,
                Err(err) => {
                    error!(?err, %user_id, "failed to create stripe customer");
                    return JsonResponse::server_error("Failed to create payment intent")
                        .into_response();
                }
            };
            // The customer carries user_id metadata, so onboarding still
            // resolves even if this write is lost.
            if let Err(err) = app_state.users.set_stripe_customer_id(user_id, &id).await {
                warn!(?err, %user_id, customer_id = %id, "failed to persist stripe customer id");
            }
            id
        }
    };

    let mut metadata = BTreeMap::new();
    metadata.insert(METADATA_USER_ID.to_string(), user_id.to_string());
    metadata.insert(METADATA_BUNDLES.to_string(), encode_bundles(&request.bundles));
    metadata.insert(
        METADATA_WORKSPACE_NAME.to_string(),
        request.workspace_name.clone(),
    );
    if let Some(code) = &request.referral_code {
        metadata.insert(METADATA_REFERRAL_CODE.to_string(), code.clone());
    }

    let intent = match app_state
        .stripe
        .create_payment_intent(CreatePaymentIntentRequest {
            amount: request.amount,
            currency: request.currency.clone(),
            customer: Some(customer_id),
            metadata,
        })
        .await
    {
        Ok(i) => i,
        Err(StripeServiceError::InvalidRequest(msg)) => {
            warn!(%user_id, %msg, "stripe rejected payment intent parameters");
            return JsonResponse::bad_request_with_code(&msg, "invalid_request").into_response();
        }
        Err(err) => {
            error!(?err, %user_id, "failed to create payment intent");
            return JsonResponse::server_error("Failed to create payment intent").into_response();
        }
    };

    info!(
        %user_id,
        payment_intent = %intent.id,
        amount = intent.amount,
        "payment intent created"
    );
    Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
        payment_intent_id: intent.id,
        amount: intent.amount,
        currency: intent.currency,
        status: intent.status,
    })
    .into_response()
}

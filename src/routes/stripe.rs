use axum::Json;
use axum::{extract::State, http::HeaderMap, response::IntoResponse};
use axum::response::Response;
use serde_json::json;
use tracing::{error, info, warn};

use crate::models::webhook_event::WebhookEventLog;
use crate::responses::JsonResponse;
use crate::services::billing::{self, WebhookOutcome};
use crate::services::stripe::StripeEvent;
use crate::state::AppState;

// Best-effort audit write. A failure here never blocks processing.
async fn log_event(app_state: &AppState, evt: &StripeEvent) {
    if let Err(err) = app_state
        .webhook_events
        .log_event(&WebhookEventLog::from_event(evt))
        .await
    {
        warn!(?err, event_id = %evt.id, "failed to log stripe event");
    }
}

async fn mark_processed(app_state: &AppState, evt: &StripeEvent, outcome: &str) {
    if let Err(err) = app_state
        .webhook_events
        .mark_processed(&evt.id, outcome)
        .await
    {
        warn!(?err, event_id = %evt.id, "failed to mark stripe event processed");
    }
}

// POST /api/payments/webhook
pub async fn webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let sig = match headers
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok())
    {
        Some(s) => s,
        None => return JsonResponse::bad_request("Missing Stripe-Signature").into_response(),
    };

    let evt = match app_state.stripe.verify_webhook(&body, sig) {
        Ok(e) => e,
        Err(err) => {
            warn!(?err, "stripe webhook verification failed");
            return JsonResponse::bad_request("Invalid webhook").into_response();
        }
    };
    let evt_type = evt.r#type.as_str();

    match app_state.webhook_events.has_processed_event(&evt.id).await {
        Ok(true) => {
            info!(event_id = %evt.id, evt_type, "duplicate stripe delivery skipped");
            log_event(&app_state, &evt).await;
            return Json(json!({ "received": true, "duplicate": true })).into_response();
        }
        Ok(false) => {}
        Err(err) => {
            // Handlers tolerate reprocessing: user writes are overwrites and
            // referral credit is keyed by payment intent.
            warn!(?err, event_id = %evt.id, "could not check processed stripe events");
        }
    }

    log_event(&app_state, &evt).await;

    match billing::dispatch(&app_state, &evt).await {
        Ok(outcome) => {
            if let WebhookOutcome::Processed(detail) | WebhookOutcome::Ignored(detail) = &outcome {
                info!(event_id = %evt.id, evt_type, detail = %detail, "stripe event handled");
            }
            mark_processed(&app_state, &evt, outcome.as_str()).await;
            Json(json!({ "received": true, "outcome": outcome.as_str() })).into_response()
        }
        Err(err) if err.is_business() => {
            warn!(%err, event_id = %evt.id, evt_type, "stripe event not applied");
            mark_processed(&app_state, &evt, err.code()).await;
            Json(json!({ "received": true, "outcome": err.code() })).into_response()
        }
        Err(err) => {
            error!(?err, event_id = %evt.id, evt_type, "stripe webhook processing failed");
            JsonResponse::server_error("Webhook processing failed").into_response()
        }
    }
}

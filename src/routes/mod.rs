pub mod auth;
pub mod payments;
pub mod stripe;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};

use crate::responses::JsonResponse;
use crate::state::AppState;

/// Every route the service exposes, without middleware. `main` layers
/// tracing, rate limiting and CORS on top.
pub fn api_router() -> Router<AppState> {
    let payment_routes = Router::new()
        .route("/webhook", post(stripe::webhook))
        .route(
            "/create-payment-intent",
            post(payments::create_payment_intent),
        );

    Router::new()
        .route("/", get(root))
        .nest("/api/payments", payment_routes)
}

/// A simple root route.
async fn root() -> Response {
    JsonResponse::success("Mewayz billing is running").into_response()
}

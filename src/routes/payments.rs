//! Checkout and order endpoints

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;

use crate::routes::{authenticate, json_response, read_json_body, require_admin, FullBody};
use crate::server::AppState;
use crate::services::{CreateCheckoutRequest, PaymentOutcome};
use crate::types::Result;

#[derive(Debug, Deserialize)]
struct PaymentSuccessBody {
    #[serde(rename = "sessionId")]
    session_id: String,
}

/// POST /create-checkout-session
pub async fn create_checkout_session(
    state: &AppState,
    req: Request<Incoming>,
) -> Result<Response<FullBody>> {
    authenticate(state, &req)?;
    let body: CreateCheckoutRequest = read_json_body(req).await?;

    let url = state.checkout.initiate_checkout(body).await?;
    Ok(json_response(StatusCode::OK, &serde_json::json!({ "url": url })))
}

/// POST /payment-success
///
/// Unauthenticated by design: the session id is worthless unless the
/// processor confirms it as paid, and confirmation is idempotent.
pub async fn payment_success(
    state: &AppState,
    req: Request<Incoming>,
) -> Result<Response<FullBody>> {
    let body: PaymentSuccessBody = read_json_body(req).await?;

    let outcome = state.checkout.confirm_payment(&body.session_id).await?;
    let response = match outcome {
        PaymentOutcome::Recorded { order_id } => serde_json::json!({
            "acknowledged": true,
            "insertedId": order_id.to_hex(),
        }),
        PaymentOutcome::AlreadyRecorded { order_id } => serde_json::json!({
            "message": "Order already recorded",
            "insertedId": order_id.to_hex(),
        }),
    };

    Ok(json_response(StatusCode::OK, &response))
}

/// GET /my-orders - orders scoped to the verified caller
pub async fn my_orders(state: &AppState, req: Request<Incoming>) -> Result<Response<FullBody>> {
    let caller = authenticate(state, &req)?;
    let orders = state.orders.list_by_user_email(&caller).await?;
    Ok(json_response(StatusCode::OK, &orders))
}

/// GET /transaction-history - admin view of all orders
pub async fn transaction_history(
    state: &AppState,
    req: Request<Incoming>,
) -> Result<Response<FullBody>> {
    require_admin(state, &req).await?;
    let orders = state.orders.list_all().await?;
    Ok(json_response(StatusCode::OK, &orders))
}

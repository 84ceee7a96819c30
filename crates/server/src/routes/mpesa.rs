//! Mock payment gateway handlers.
//!
//! `stkpush` initiates a simulated payment; `callback` is the public
//! webhook a real gateway would call (and the path a deployment keeps when
//! swapping the simulator for the real integration); `query` polls the
//! current transaction status.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::services::orders::PaymentAck;
use crate::services::payments::{CallbackEnvelope, StkPushResponse};
use crate::state::AppState;

/// Build the mpesa router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stkpush", post(stk_push))
        .route("/callback", post(callback))
        .route("/query", post(query_status))
}

/// Request to initiate a simulated STK push.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StkPushRequest {
    pub phone_number: String,
    pub order_number: String,
}

/// Request to poll a transaction's status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub checkout_request_id: String,
}

/// Status-poll response in the gateway's vocabulary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub success: bool,
    pub result_code: String,
    pub result_desc: String,
}

/// Initiate a simulated payment for an order.
async fn stk_push(
    RequireUser(_user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<StkPushRequest>,
) -> Result<Json<StkPushResponse>, AppError> {
    if body.phone_number.trim().is_empty() || body.order_number.trim().is_empty() {
        return Err(AppError::Validation(
            "Phone number and order number are required".to_owned(),
        ));
    }

    let response = state
        .payments()
        .initiate(&body.order_number, &body.phone_number)
        .await?;

    Ok(Json(response))
}

/// Gateway result webhook.
///
/// Always acknowledges with result code 0, including for unknown
/// correlation ids, so the gateway does not retry. Malformed bodies are the
/// only 400.
async fn callback(
    State(state): State<AppState>,
    Json(body): Json<CallbackEnvelope>,
) -> Result<Json<Value>, AppError> {
    let stk = body.body.stk_callback;
    let receipt = stk.receipt_number();

    tracing::info!(
        checkout_request_id = %stk.checkout_request_id,
        result_code = stk.result_code,
        result_desc = %stk.result_desc,
        "payment callback received"
    );

    match state
        .orders()
        .record_payment_result(&stk.checkout_request_id, stk.succeeded(), receipt)
        .await
    {
        Ok(PaymentAck::Applied(_) | PaymentAck::Ignored) => {}
        Err(e) => {
            // The webhook contract still demands an acknowledgement.
            tracing::error!(error = %e, "failed to apply payment callback");
        }
    }

    Ok(Json(json!({ "ResultCode": 0, "ResultDesc": "Success" })))
}

/// Poll a transaction's status by checkout request id.
async fn query_status(
    RequireUser(_user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    use ecoshop_core::PaymentStatus;

    let order = state
        .orders()
        .find_by_correlation(&body.checkout_request_id)
        .await?;

    let (result_code, result_desc) = match order.map(|o| o.payment_status) {
        Some(PaymentStatus::Completed) => {
            ("0", "The service request has been accepted successfully")
        }
        Some(PaymentStatus::Failed) => ("1", "The balance is insufficient for the transaction"),
        Some(PaymentStatus::Pending | PaymentStatus::Refunded) => {
            ("1037", "DS timeout user cannot be reached")
        }
        None => ("1032", "Request cancelled by user"),
    };

    Ok(Json(QueryResponse {
        success: true,
        result_code: result_code.to_owned(),
        result_desc: result_desc.to_owned(),
    }))
}

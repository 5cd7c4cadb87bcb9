//! Payments against a transaction.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use defter_core::{PaymentReceipt, PaymentRequest};

use crate::error::ApiResult;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/payments", post(record_payment))
}

/// Reduces the transaction's outstanding total and the customer's debt,
/// and writes a debt_collection record.
async fn record_payment(
    State(state): State<AppState>,
    AppJson(request): AppJson<PaymentRequest>,
) -> ApiResult<Json<PaymentReceipt>> {
    let receipt = state
        .db
        .transactions()
        .record_payment(request, state.config.usd_try_rate)
        .await?;
    Ok(Json(receipt))
}

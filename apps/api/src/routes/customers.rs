//! Customer endpoints, including the debt ledger views.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use defter_core::{
    Customer, CustomerPaymentRequest, CustomerPaymentResult, CustomerUpdate, DebtStatus, NewCustomer,
};
use defter_db::DbError;

use crate::error::ApiResult;
use crate::extract::{AppJson, AppQuery};
use crate::routes::SearchQuery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list_customers).post(create_customer))
        .route(
            "/api/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/api/customers/{id}/debt", get(debt_status))
        .route("/api/customers/{id}/payment", post(record_payment))
}

async fn list_customers(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> ApiResult<Json<Vec<Customer>>> {
    let term = query.term()?;
    Ok(Json(state.db.customers().list(term.as_deref()).await?))
}

async fn get_customer(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Customer>> {
    let customer = state
        .db
        .customers()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", &id))?;
    Ok(Json(customer))
}

async fn create_customer(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewCustomer>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.db.customers().create(input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<CustomerUpdate>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().update(&id, input).await?))
}

async fn delete_customer(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.customers().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn debt_status(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<DebtStatus>> {
    let config = &state.config;
    let status = state
        .db
        .customers()
        .debt_status(&id, config.usd_try_rate, config.debt_limits)
        .await?;
    Ok(Json(status))
}

async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payment): AppJson<CustomerPaymentRequest>,
) -> ApiResult<Json<CustomerPaymentResult>> {
    let new_debt = state
        .db
        .customers()
        .record_payment(&id, payment, state.config.usd_try_rate)
        .await?;

    Ok(Json(CustomerPaymentResult {
        success: true,
        new_debt_cents: new_debt.cents(),
    }))
}

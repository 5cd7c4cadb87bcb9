//! Invoice endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use defter_core::validation::validate_search_query;
use defter_core::{
    CreateInvoice, NewTransactionItem, Transaction, TransactionItem, TransactionPatch,
    TransactionQuery, TransactionWithItems, ValidationErrors,
};
use defter_db::DbError;

use crate::error::ApiResult;
use crate::extract::{AppJson, AppQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/transactions", get(list_transactions).post(create_transaction))
        .route(
            "/api/transactions/{id}",
            get(get_transaction).patch(patch_transaction),
        )
        .route(
            "/api/transactions/{id}/items",
            get(transaction_items).put(replace_items),
        )
}

async fn list_transactions(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TransactionQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let term = match query.search.as_deref() {
        Some(search) => validate_search_query(search).map_err(ValidationErrors::from)?,
        None => None,
    };

    let transactions = state
        .db
        .transactions()
        .list(query.limit, query.offset, term.as_deref())
        .await?;
    Ok(Json(transactions))
}

/// Posts an invoice: lines, stock and (for credit sales) the customer's debt.
async fn create_transaction(
    State(state): State<AppState>,
    AppJson(invoice): AppJson<CreateInvoice>,
) -> ApiResult<(StatusCode, Json<TransactionWithItems>)> {
    let posted = state
        .db
        .transactions()
        .create_invoice(invoice, state.config.usd_try_rate)
        .await?;
    Ok((StatusCode::CREATED, Json(posted)))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TransactionWithItems>> {
    let transaction = state
        .db
        .transactions()
        .get_with_items(&id)
        .await?
        .ok_or_else(|| DbError::not_found("Transaction", &id))?;
    Ok(Json(transaction))
}

async fn patch_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(patch): AppJson<TransactionPatch>,
) -> ApiResult<Json<Transaction>> {
    Ok(Json(state.db.transactions().patch(&id, patch).await?))
}

async fn transaction_items(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<TransactionItem>>> {
    Ok(Json(state.db.transactions().items(&id).await?))
}

async fn replace_items(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(items): AppJson<Vec<NewTransactionItem>>,
) -> ApiResult<Json<Vec<TransactionItem>>> {
    Ok(Json(state.db.transactions().replace_items(&id, items).await?))
}

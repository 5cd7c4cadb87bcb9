//! Supplier endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use defter_core::{NewSupplier, Product, Supplier, SupplierUpdate};
use defter_db::DbError;

use crate::error::ApiResult;
use crate::extract::{AppJson, AppQuery};
use crate::routes::SearchQuery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/suppliers", get(list_suppliers).post(create_supplier))
        .route(
            "/api/suppliers/{id}",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
        .route("/api/suppliers/{id}/products", get(supplier_products))
}

async fn list_suppliers(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> ApiResult<Json<Vec<Supplier>>> {
    let term = query.term()?;
    Ok(Json(state.db.suppliers().list(term.as_deref()).await?))
}

async fn get_supplier(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Supplier>> {
    let supplier = state
        .db
        .suppliers()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| DbError::not_found("Supplier", &id))?;
    Ok(Json(supplier))
}

async fn create_supplier(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewSupplier>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    let supplier = state.db.suppliers().create(input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<SupplierUpdate>,
) -> ApiResult<Json<Supplier>> {
    Ok(Json(state.db.suppliers().update(&id, input).await?))
}

/// Removes the supplier together with its products.
async fn delete_supplier(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.suppliers().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn supplier_products(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.suppliers().products(&id).await?))
}

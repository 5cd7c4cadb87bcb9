//! Product endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use defter_core::{NewProduct, Product, ProductSalesHistory, ProductUpdate};
use defter_db::DbError;

use crate::error::ApiResult;
use crate::extract::{AppJson, AppQuery};
use crate::routes::SearchQuery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/low-stock", get(low_stock))
        .route("/api/products/barcode/{barcode}", get(get_by_barcode))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/products/{id}/sales-history", get(sales_history))
}

async fn list_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let term = query.term()?;
    Ok(Json(state.db.products().list(term.as_deref()).await?))
}

async fn low_stock(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().low_stock().await?))
}

async fn get_by_barcode(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> ApiResult<Json<Product>> {
    let product = state
        .db
        .products()
        .get_by_barcode(&barcode)
        .await?
        .ok_or_else(|| DbError::not_found("Product", &barcode))?;
    Ok(Json(product))
}

async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Product>> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| DbError::not_found("Product", &id))?;
    Ok(Json(product))
}

async fn create_product(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state.db.products().create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<ProductUpdate>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().update(&id, input).await?))
}

async fn delete_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.products().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn sales_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductSalesHistory>> {
    Ok(Json(state.db.products().sales_history(&id).await?))
}

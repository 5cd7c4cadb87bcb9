//! HTTP routes.
//!
//! ```text
//! /api/health
//! /api/products        /api/customers       /api/suppliers
//! /api/transactions    /api/payments        /api/dashboard/metrics
//! ```

pub mod customers;
pub mod dashboard;
pub mod health;
pub mod payments;
pub mod products;
pub mod suppliers;
pub mod transactions;

use axum::Router;
use serde::Deserialize;

use defter_core::validation::validate_search_query;
use defter_core::ValidationErrors;

use crate::error::ApiResult;
use crate::state::AppState;

/// Every route, without middleware and state.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .merge(customers::router())
        .merge(suppliers::router())
        .merge(transactions::router())
        .merge(payments::router())
        .merge(dashboard::router())
}

/// `?search=` of the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

impl SearchQuery {
    /// The trimmed term, `None` when absent or blank.
    pub fn term(&self) -> ApiResult<Option<String>> {
        match self.search.as_deref() {
            Some(search) => Ok(validate_search_query(search).map_err(ValidationErrors::from)?),
            None => Ok(None),
        }
    }
}

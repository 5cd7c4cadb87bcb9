//! Dashboard figures.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use defter_core::DashboardMetrics;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard/metrics", get(metrics))
}

async fn metrics(State(state): State<AppState>) -> ApiResult<Json<DashboardMetrics>> {
    let metrics = state
        .db
        .reports()
        .dashboard_metrics(state.config.usd_try_rate, Utc::now())
        .await?;
    Ok(Json(metrics))
}

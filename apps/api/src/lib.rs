//! # Defter API
//!
//! REST server for the Defter ERP backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         API Server                                      │
//! │                                                                         │
//! │  SPA ───► HTTP (5000) ───► routes ───► defter-db ───► SQLite           │
//! │                               │                                         │
//! │                               ▼                                         │
//! │                          ApiError → {code, message, errors}            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Middleware (outermost first)
//! - `TraceLayer` - one span per request
//! - `CorsLayer::permissive()` - the SPA may be served from another origin
//! - `TimeoutLayer` - 408 after `REQUEST_TIMEOUT_SECS`
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_HOST` / `HTTP_PORT` - bind address (default: 0.0.0.0:5000)
//! - `DATABASE_PATH` - SQLite file (default: ./defter.db)
//! - `DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `USD_TRY_RATE` - TRY per USD (default: 33)
//! - `DEBT_LIMIT_TRY` / `DEBT_LIMIT_USD` - credit limits (default: 5000 / 150)
//! - `REQUEST_TIMEOUT_SECS` - request timeout (default: 30)

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use axum::http::StatusCode;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

// Re-exports
pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the fully configured application.
///
/// Used by the server binary and by the HTTP tests.
pub fn build_app(state: AppState) -> Router {
    let timeout = state.config.request_timeout;

    routes::api_router()
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

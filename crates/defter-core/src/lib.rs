//! # defter-core: Pure Business Logic for Defter ERP
//!
//! This crate holds the business rules of the ERP backend as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Defter Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (SPA)                               │   │
//! │  │   Inventory ──► Invoice form ──► Customers ──► Dashboard        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    defter-api (axum)                            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ defter-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  ledger   │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │  credit   │  │   rules   │  │   │
//! │  │   │  Customer │  │ Exchange- │  │  payment  │  │  checks   │  │   │
//! │  │   │  Invoice  │  │   Rate    │  │  totals   │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    defter-db (Database Layer)                   │   │
//! │  │          SQLite queries, migrations, atomic postings            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Supplier, Transaction, ...)
//! - [`money`] - Integer money and the USD→TRY exchange rate
//! - [`ledger`] - Debt ledger and invoice total rules
//! - [`numbering`] - Transaction numbers, SKUs and supplier codes
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use defter_core::money::{ExchangeRate, Money};
//! use defter_core::types::Currency;
//!
//! let rate = ExchangeRate::from_whole(33);
//! let debt = rate.to_try(Money::from_cents(10_000), Currency::Usd).unwrap();
//!
//! // $100.00 at 33 TRY/USD = ₺3300.00
//! assert_eq!(debt.cents(), 330_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod numbering;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError, ValidationErrors};
pub use money::{ExchangeRate, Money};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single invoice line.
///
/// ## Business Reason
/// Catches typos such as 10000 instead of 100 on the invoice form.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Maximum number of lines on a single invoice.
pub const MAX_INVOICE_ITEMS: usize = 200;

/// Largest amount, in cents, accepted for a price, discount, tax or payment.
///
/// 10 billion in major units. Line totals and invoice sums of bounded
/// inputs stay far inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;

/// Default reorder threshold applied when a product is created without one.
pub const DEFAULT_MIN_QUANTITY: i64 = 5;

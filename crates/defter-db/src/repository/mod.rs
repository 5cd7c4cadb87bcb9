//! # Repository Module
//!
//! Database repository implementations for Defter.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                           │
//! │       │                                                                 │
//! │       │  state.db.transactions().create_invoice(invoice, rate)          │
//! │       ▼                                                                 │
//! │  TransactionRepository                                                  │
//! │  ├── opens ONE sqlx transaction                                         │
//! │  ├── asks defter-core what to change (ledger, totals)                   │
//! │  ├── applies it with atomic SQL                                         │
//! │  └── commits (or rolls back on drop)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Helpers that must run inside another repository's transaction take a
//! `&mut SqliteConnection` instead of using the pool.
//!
//! Every transaction that writes starts with [`begin_write`] (`BEGIN
//! IMMEDIATE`). A deferred transaction that reads first takes the write
//! lock only at its first write, and SQLite fails that upgrade at once
//! with `SQLITE_BUSY` when another writer is active, without waiting on
//! the busy timeout.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD, search, stock
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers and the debt balance
//! - [`SupplierRepository`](supplier::SupplierRepository) - Suppliers and their products
//! - [`TransactionRepository`](transaction::TransactionRepository) - Invoices and payments
//! - [`ReportRepository`](report::ReportRepository) - Dashboard metrics

pub mod customer;
pub mod product;
pub mod report;
pub mod supplier;
pub mod transaction;

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::DbResult;

/// Attempts made when a generated business identifier collides.
pub(crate) const MAX_GENERATED_ID_ATTEMPTS: usize = 5;

/// Builds a `LIKE` pattern matching `search` anywhere, case-insensitively.
///
/// `%`, `_` and `\` in the input match literally; queries use
/// `LOWER(column) LIKE ? ESCAPE '\'`.
pub(crate) fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Opens a transaction holding the write lock from its first statement.
///
/// Concurrent writers queue on the connection's busy timeout instead of
/// failing with "database is locked".
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Generates a new entity ID.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Tea"), "%tea%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}

//! # Report Repository
//!
//! Aggregates for the dashboard cards.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use defter_core::ledger::converted;
use defter_core::{CoreError, Currency, DashboardMetrics, ExchangeRate, Money};

/// Repository for read-only reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Dashboard figures as of `now`.
    ///
    /// ## Figures
    /// ```text
    /// totalSales      completed sales since the 1st of the month, in TRY
    /// totalOrders     all sales
    /// newCustomers    customers created since the 1st of the month
    /// activeProducts  active products
    /// lowStockCount   products with quantity <= min_quantity
    /// pendingOrders   pending sales
    /// activeCustomers distinct customers on this month's sales and payments
    /// returns         cancelled sales
    /// ```
    ///
    /// USD sales are converted with `rate`. Payment rows are not orders, but
    /// a customer who only paid this month still counts as active.
    pub async fn dashboard_metrics(
        &self,
        rate: ExchangeRate,
        now: DateTime<Utc>,
    ) -> DbResult<DashboardMetrics> {
        let since = month_start(now);
        debug!(since = %since, "Computing dashboard metrics");

        let sales: Vec<(Currency, i64)> = sqlx::query_as(
            r#"
            SELECT currency, COALESCE(SUM(total_cents), 0)
            FROM transactions
            WHERE transaction_type = 'sale'
              AND status = 'completed'
              AND created_at >= ?1
            GROUP BY currency
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let mut total_sales = Money::zero();
        for (currency, cents) in sales {
            let amount = converted(rate, Money::from_cents(cents), currency, "total sales")?;
            total_sales = total_sales
                .checked_add(amount)
                .ok_or_else(|| CoreError::AmountOverflow {
                    context: "total sales".to_string(),
                })?;
        }

        let (total_orders, pending_orders, returns): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END), 0)
            FROM transactions
            WHERE transaction_type = 'sale'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let active_customers: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT customer_id) FROM transactions WHERE created_at >= ?1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        let (active_products, low_stock_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN is_active = 1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN quantity <= min_quantity THEN 1 ELSE 0 END), 0)
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let new_customers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE created_at >= ?1")
                .bind(since)
                .fetch_one(&self.pool)
                .await?;

        Ok(DashboardMetrics {
            total_sales_cents: total_sales.cents(),
            total_orders,
            active_products,
            new_customers,
            low_stock_count,
            pending_orders,
            active_customers,
            returns,
        })
    }
}

/// Midnight UTC on the first day of `now`'s month.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

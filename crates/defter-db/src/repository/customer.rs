//! # Customer Repository
//!
//! Database operations for customers and their debt balance.
//!
//! ## Debt Balance Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total_debt_cents is written ONLY by these statements:                 │
//! │                                                                         │
//! │  add_debt()     total_debt_cents = total_debt_cents + ?                 │
//! │  reduce_debt()  total_debt_cents = MAX(0, total_debt_cents - ?)         │
//! │                                                                         │
//! │  Both are single atomic UPDATEs: two credit sales posted at the same    │
//! │  time both land, neither overwrites the other.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, like_pattern, new_id};
use defter_core::ledger::{converted, debt_status, DebtLimits};
use defter_core::validation::Validate;
use defter_core::{
    CoreError, Currency, Customer, CustomerPaymentRequest, CustomerUpdate, DebtStatus,
    ExchangeRate, Money, NewCustomer,
};

const CUSTOMER_COLUMNS: &str = r#"
    id, name, email, phone, address,
    total_debt_cents, debt_currency, is_active, created_at, updated_at
"#;

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists customers, newest first, optionally filtered by name.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<Customer>> {
        let customers = match search {
            Some(term) => {
                let sql = format!(
                    r#"
                    SELECT {CUSTOMER_COLUMNS} FROM customers
                    WHERE LOWER(name) LIKE ?1 ESCAPE '\'
                    ORDER BY created_at DESC, rowid DESC
                    "#
                );
                sqlx::query_as::<_, Customer>(&sql)
                    .bind(like_pattern(term))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at DESC, rowid DESC"
                );
                sqlx::query_as::<_, Customer>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(customers)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        fetch_customer(&mut conn, id).await
    }

    /// Creates a customer with a zero TRY balance.
    pub async fn create(&self, input: NewCustomer) -> DbResult<Customer> {
        input.validate().map_err(CoreError::from)?;

        let now = Utc::now();
        let customer = Customer {
            id: new_id(),
            name: input.name.trim().to_string(),
            email: input.email,
            phone: input.phone,
            address: input.address,
            total_debt_cents: 0,
            debt_currency: Currency::Try,
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, email, phone, address,
                total_debt_cents, debt_currency, is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10
            )
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.total_debt_cents)
        .bind(customer.debt_currency)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %customer.id, "Customer created");
        Ok(customer)
    }

    /// Applies a partial update. The debt balance is not editable here.
    pub async fn update(&self, id: &str, input: CustomerUpdate) -> DbResult<Customer> {
        input.validate().map_err(CoreError::from)?;
        debug!(id = %id, "Updating customer");

        let mut tx = begin_write(&self.pool).await?;

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = COALESCE(?2, name),
                email = COALESCE(?3, email),
                phone = COALESCE(?4, phone),
                address = COALESCE(?5, address),
                is_active = COALESCE(?6, is_active),
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.email.as_deref())
        .bind(input.phone.as_deref())
        .bind(input.address.as_deref())
        .bind(input.is_active)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        let customer = fetch_customer(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?;

        tx.commit().await?;
        Ok(customer)
    }

    /// Hard-deletes a customer. Their transactions stay, unlinked.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        info!(id = %id, "Customer deleted");
        Ok(())
    }

    /// Debt of a customer against the credit limits.
    pub async fn debt_status(
        &self,
        id: &str,
        rate: ExchangeRate,
        limits: DebtLimits,
    ) -> DbResult<DebtStatus> {
        let customer = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?;

        Ok(debt_status(customer.total_debt(), rate, limits))
    }

    /// Takes a payment off the debt balance, not tied to any invoice.
    ///
    /// The amount is converted to TRY first. Returns the new balance.
    pub async fn record_payment(
        &self,
        id: &str,
        payment: CustomerPaymentRequest,
        rate: ExchangeRate,
    ) -> DbResult<Money> {
        payment.validate().map_err(CoreError::from)?;

        let currency = payment.currency.unwrap_or_default();
        let amount = converted(
            rate,
            Money::from_cents(payment.amount_cents),
            currency,
            "debt reduction",
        )?;

        let mut tx = begin_write(&self.pool).await?;

        let updated = reduce_debt(&mut tx, id, amount).await?;
        if !updated {
            return Err(DbError::not_found("Customer", id));
        }

        let new_debt: i64 =
            sqlx::query_scalar("SELECT total_debt_cents FROM customers WHERE id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        info!(id = %id, amount_cents = amount.cents(), new_debt_cents = new_debt, "Customer payment recorded");
        Ok(Money::from_cents(new_debt))
    }
}

// =============================================================================
// Connection-level helpers (run inside a caller's transaction)
// =============================================================================

pub(crate) async fn fetch_customer(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Customer>> {
    let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");
    let customer = sqlx::query_as::<_, Customer>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(customer)
}

/// Adds a TRY amount to the debt balance. Returns false for an unknown id.
pub(crate) async fn add_debt(conn: &mut SqliteConnection, id: &str, amount: Money) -> DbResult<bool> {
    debug!(id = %id, amount_cents = amount.cents(), "Adding debt");

    let result = sqlx::query(
        r#"
        UPDATE customers
        SET total_debt_cents = total_debt_cents + ?2,
            debt_currency = 'TRY',
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(amount.cents())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Takes a TRY amount off the debt balance, clamped at zero.
/// Returns false for an unknown id.
pub(crate) async fn reduce_debt(
    conn: &mut SqliteConnection,
    id: &str,
    amount: Money,
) -> DbResult<bool> {
    debug!(id = %id, amount_cents = amount.cents(), "Reducing debt");

    let result = sqlx::query(
        r#"
        UPDATE customers
        SET total_debt_cents = MAX(0, total_debt_cents - ?2),
            debt_currency = 'TRY',
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(amount.cents())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Unit Tests
// =============================================================================

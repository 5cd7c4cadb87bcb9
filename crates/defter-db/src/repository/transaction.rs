//! # Transaction Repository
//!
//! Invoices, their line items, and payments against them.
//!
//! ## Invoice Posting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_invoice()                      ONE database transaction         │
//! │                                                                         │
//! │  1. resolve customer (404 if unknown), snapshot its name                │
//! │  2. resolve every product (404 if unknown), default price/name          │
//! │  3. totals = Σ price × qty − discount + tax                             │
//! │  4. INSERT transactions (INV-YYYYMMDD-XXXXXX, retried on collision)     │
//! │  5. INSERT transaction_items, quantity = MAX(0, quantity - n)           │
//! │  6. credit sale? total_debt_cents += total in TRY                       │
//! │  7. COMMIT                                                              │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: nothing is kept.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Payment Posting
//! ```text
//! record_payment(amount)
//!   ├── ledger::apply_payment()     rules: owner, type, overpayment
//!   ├── UPDATE transactions SET total_cents = total_cents - amount,
//!   │       status = completed | pending  WHERE total_cents >= amount
//!   ├── total_debt_cents = MAX(0, total_debt_cents - amount in TRY)
//!   └── INSERT debt_collection row (PAY-..., total = -amount)
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::customer::{add_debt, fetch_customer, reduce_debt};
use crate::repository::product::{adjust_stock, fetch_product};
use crate::repository::{MAX_GENERATED_ID_ATTEMPTS, begin_write, like_pattern, new_id};
use defter_core::ledger::{apply_payment, credit_debt_delta, default_status, invoice_totals};
use defter_core::numbering::{transaction_number, NumberKind};
use defter_core::validation::{validate_items, Validate};
use defter_core::{
    CoreError, CreateInvoice, ExchangeRate, Money, NewTransactionItem, PaymentReceipt,
    PaymentRequest, PaymentType, Transaction, TransactionItem, TransactionPatch,
    TransactionStatus, TransactionType, TransactionWithItems, ValidationError,
};

const TRANSACTION_COLUMNS: &str = r#"
    id, transaction_number, customer_id, customer_name,
    total_cents, discount_cents, tax_cents,
    payment_type, currency, status, transaction_type,
    created_at, updated_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, transaction_id, product_id, product_name,
    quantity, price_cents, total_cents, created_at
"#;

/// Default page size of the transaction list.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page the transaction list returns.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Lists transactions, newest first.
    ///
    /// `limit` defaults to 10 and is capped at 100. The search term matches
    /// the transaction number or the customer name.
    pub async fn list(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
        search: Option<&str>,
    ) -> DbResult<Vec<Transaction>> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0).max(0);

        let transactions = match search {
            Some(term) => {
                let sql = format!(
                    r#"
                    SELECT {TRANSACTION_COLUMNS} FROM transactions
                    WHERE LOWER(transaction_number) LIKE ?1 ESCAPE '\'
                       OR LOWER(COALESCE(customer_name, '')) LIKE ?1 ESCAPE '\'
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT ?2 OFFSET ?3
                    "#
                );
                sqlx::query_as::<_, Transaction>(&sql)
                    .bind(like_pattern(term))
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    r#"
                    SELECT {TRANSACTION_COLUMNS} FROM transactions
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT ?1 OFFSET ?2
                    "#
                );
                sqlx::query_as::<_, Transaction>(&sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(transactions)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let mut conn = self.pool.acquire().await?;
        fetch_transaction(&mut conn, id).await
    }

    /// A transaction together with its items.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<TransactionWithItems>> {
        let mut conn = self.pool.acquire().await?;

        let Some(transaction) = fetch_transaction(&mut conn, id).await? else {
            return Ok(None);
        };
        let items = fetch_items(&mut conn, id).await?;

        Ok(Some(TransactionWithItems { transaction, items }))
    }

    /// Items of a transaction. Unknown transactions are a NotFound error.
    pub async fn items(&self, id: &str) -> DbResult<Vec<TransactionItem>> {
        let mut conn = self.pool.acquire().await?;

        if fetch_transaction(&mut conn, id).await?.is_none() {
            return Err(DbError::not_found("Transaction", id));
        }

        fetch_items(&mut conn, id).await
    }

    /// Posts an invoice: header, lines, stock and debt in one transaction.
    pub async fn create_invoice(
        &self,
        invoice: CreateInvoice,
        rate: ExchangeRate,
    ) -> DbResult<TransactionWithItems> {
        invoice.validate().map_err(CoreError::from)?;
        let header = invoice.transaction;

        let mut tx = begin_write(&self.pool).await?;

        // 1. Customer
        let customer_id = header
            .customer_id
            .filter(|id| !id.trim().is_empty());
        let customer = match customer_id.as_deref() {
            Some(id) => Some(
                fetch_customer(&mut tx, id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Customer", id))?,
            ),
            None => None,
        };
        let customer_name = header
            .customer_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .or_else(|| customer.as_ref().map(|c| c.name.clone()));

        // 2. Lines
        let now = Utc::now();
        let transaction_id = new_id();
        let mut items = Vec::with_capacity(invoice.items.len());
        for (index, line) in invoice.items.into_iter().enumerate() {
            items.push(resolve_line(&mut tx, &transaction_id, index, line, now).await?);
        }

        // 3. Totals
        let line_totals: Vec<Money> = items.iter().map(|i| Money::from_cents(i.total_cents)).collect();
        let totals = invoice_totals(
            &line_totals,
            Money::from_cents(header.discount_cents.unwrap_or(0)),
            Money::from_cents(header.tax_cents.unwrap_or(0)),
        )?;

        let payment_type = header.payment_type.unwrap_or_default();
        let mut transaction = Transaction {
            id: transaction_id,
            transaction_number: transaction_number(NumberKind::Invoice, now),
            customer_id: customer.as_ref().map(|c| c.id.clone()),
            customer_name,
            total_cents: totals.total.cents(),
            discount_cents: totals.discount.cents(),
            tax_cents: totals.tax.cents(),
            payment_type,
            currency: header.currency.unwrap_or_default(),
            status: header.status.unwrap_or_else(|| default_status(payment_type)),
            transaction_type: TransactionType::Sale,
            created_at: now,
            updated_at: now,
        };

        // 4. Header
        insert_transaction(&mut tx, &mut transaction, NumberKind::Invoice).await?;

        // 5. Lines and stock
        for item in &items {
            insert_item(&mut tx, item).await?;
            if let Some(product_id) = item.product_id.as_deref() {
                adjust_stock(&mut tx, product_id, -item.quantity).await?;
            }
        }

        // 6. Ledger
        let delta = credit_debt_delta(payment_type, totals.total, transaction.currency, rate)?;
        if let (Some(customer), Some(delta)) = (customer.as_ref(), delta) {
            add_debt(&mut tx, &customer.id, delta).await?;
            debug!(customer_id = %customer.id, debt_added_cents = delta.cents(), "Credit sale posted to ledger");
        }

        tx.commit().await?;

        info!(
            id = %transaction.id,
            number = %transaction.transaction_number,
            total_cents = transaction.total_cents,
            items = items.len(),
            payment_type = ?transaction.payment_type,
            "Invoice posted"
        );

        Ok(TransactionWithItems { transaction, items })
    }

    /// Replaces every line of a transaction.
    ///
    /// Stock of the old lines is restored before the new lines take theirs.
    /// Stored totals are not recomputed; the editor sends them with
    /// [`patch`](Self::patch).
    pub async fn replace_items(
        &self,
        id: &str,
        lines: Vec<NewTransactionItem>,
    ) -> DbResult<Vec<TransactionItem>> {
        validate_items(&lines).map_err(CoreError::from)?;

        let mut tx = begin_write(&self.pool).await?;

        if fetch_transaction(&mut tx, id).await?.is_none() {
            return Err(DbError::not_found("Transaction", id));
        }

        for old in fetch_items(&mut tx, id).await? {
            if let Some(product_id) = old.product_id.as_deref() {
                adjust_stock(&mut tx, product_id, old.quantity).await?;
            }
        }

        sqlx::query("DELETE FROM transaction_items WHERE transaction_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now();
        let mut items = Vec::with_capacity(lines.len());
        for (index, line) in lines.into_iter().enumerate() {
            let item = resolve_line(&mut tx, id, index, line, now).await?;
            insert_item(&mut tx, &item).await?;
            if let Some(product_id) = item.product_id.as_deref() {
                adjust_stock(&mut tx, product_id, -item.quantity).await?;
            }
            items.push(item);
        }

        sqlx::query("UPDATE transactions SET updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, items = items.len(), "Transaction items replaced");
        Ok(items)
    }

    /// Overwrites header fields. No ledger side effects.
    pub async fn patch(&self, id: &str, patch: TransactionPatch) -> DbResult<Transaction> {
        patch.validate().map_err(CoreError::from)?;

        let mut tx = begin_write(&self.pool).await?;

        let result = sqlx::query(
            r#"
            UPDATE transactions SET
                customer_name = COALESCE(?2, customer_name),
                total_cents = COALESCE(?3, total_cents),
                discount_cents = COALESCE(?4, discount_cents),
                tax_cents = COALESCE(?5, tax_cents),
                payment_type = COALESCE(?6, payment_type),
                currency = COALESCE(?7, currency),
                status = COALESCE(?8, status),
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(patch.customer_name.as_deref().map(str::trim))
        .bind(patch.total_cents)
        .bind(patch.discount_cents)
        .bind(patch.tax_cents)
        .bind(patch.payment_type)
        .bind(patch.currency)
        .bind(patch.status)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", id));
        }

        let transaction = fetch_transaction(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", id))?;

        tx.commit().await?;

        info!(id = %id, "Transaction patched");
        Ok(transaction)
    }

    /// Records a payment against a transaction.
    ///
    /// ## Example Flow
    /// ```text
    /// credit sale 100.00 ─► pay 40.00 ─► total 60.00, pending,  debt 60.00
    ///                    └► pay 60.00 ─► total  0.00, completed, debt  0.00
    /// ```
    pub async fn record_payment(
        &self,
        request: PaymentRequest,
        rate: ExchangeRate,
    ) -> DbResult<PaymentReceipt> {
        request.validate().map_err(CoreError::from)?;
        let amount = Money::from_cents(request.amount_cents);

        let mut tx = begin_write(&self.pool).await?;

        let target = fetch_transaction(&mut tx, &request.transaction_id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", &request.transaction_id))?;
        let customer = fetch_customer(&mut tx, &request.customer_id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", &request.customer_id))?;

        let outcome = apply_payment(&target, &customer.id, amount, rate)?;

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET total_cents = total_cents - ?2,
                status = CASE WHEN total_cents - ?2 = 0 THEN 'completed' ELSE 'pending' END,
                updated_at = ?3
            WHERE id = ?1 AND total_cents >= ?2
            "#,
        )
        .bind(&target.id)
        .bind(amount.cents())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Another payment reduced the total after it was read.
            return Err(CoreError::Overpayment {
                transaction_number: target.transaction_number,
                outstanding_cents: target.total_cents,
                requested_cents: amount.cents(),
            }
            .into());
        }

        reduce_debt(&mut tx, &customer.id, outcome.debt_reduction).await?;

        let mut collection = Transaction {
            id: new_id(),
            transaction_number: transaction_number(NumberKind::Collection, now),
            customer_id: Some(customer.id.clone()),
            customer_name: Some(customer.name.clone()),
            total_cents: -amount.cents(),
            discount_cents: 0,
            tax_cents: 0,
            payment_type: PaymentType::DebtCollection,
            currency: target.currency,
            status: TransactionStatus::Completed,
            transaction_type: TransactionType::DebtCollection,
            created_at: now,
            updated_at: now,
        };
        insert_transaction(&mut tx, &mut collection, NumberKind::Collection).await?;

        let remaining: i64 = sqlx::query_scalar("SELECT total_cents FROM transactions WHERE id = ?1")
            .bind(&target.id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        let status = if remaining == 0 {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Pending
        };

        info!(
            transaction = %target.transaction_number,
            collection = %collection.transaction_number,
            amount_cents = amount.cents(),
            remaining_cents = remaining,
            "Payment recorded"
        );

        let message = match status {
            TransactionStatus::Completed => format!("{} is fully paid", target.transaction_number),
            _ => format!(
                "Payment of {} recorded, {} still outstanding",
                amount,
                Money::from_cents(remaining)
            ),
        };

        Ok(PaymentReceipt {
            success: true,
            remaining_amount_cents: remaining,
            amount_cents: amount.cents(),
            status,
            message,
            collection,
        })
    }
}

// =============================================================================
// Connection-level helpers
// =============================================================================

async fn fetch_transaction(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Transaction>> {
    let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1");
    let transaction = sqlx::query_as::<_, Transaction>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(transaction)
}

async fn fetch_items(conn: &mut SqliteConnection, transaction_id: &str) -> DbResult<Vec<TransactionItem>> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM transaction_items WHERE transaction_id = ?1 ORDER BY rowid"
    );
    let items = sqlx::query_as::<_, TransactionItem>(&sql)
        .bind(transaction_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(items)
}

/// Turns a requested line into a stored line, using product defaults.
async fn resolve_line(
    conn: &mut SqliteConnection,
    transaction_id: &str,
    index: usize,
    line: NewTransactionItem,
    now: chrono::DateTime<Utc>,
) -> DbResult<TransactionItem> {
    let product = fetch_product(&mut *conn, &line.product_id)
        .await?
        .ok_or_else(|| DbError::not_found("Product", &line.product_id))?;

    let price_cents = line.price_cents.unwrap_or(product.price_cents);
    let total_cents = price_cents.checked_mul(line.quantity).ok_or_else(|| {
        CoreError::from(ValidationError::OutOfRange {
            field: format!("items[{}].priceCents", index),
            min: 0,
            max: i64::MAX / line.quantity.max(1),
        })
    })?;

    Ok(TransactionItem {
        id: new_id(),
        transaction_id: transaction_id.to_string(),
        product_id: Some(product.id),
        product_name: line
            .product_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or(product.name),
        quantity: line.quantity,
        price_cents,
        total_cents,
        created_at: now,
    })
}

/// Inserts a transaction row, drawing a fresh number when the generated
/// one is already taken.
async fn insert_transaction(
    conn: &mut SqliteConnection,
    transaction: &mut Transaction,
    kind: NumberKind,
) -> DbResult<()> {
    let mut attempt = 1;
    loop {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (
                id, transaction_number, customer_id, customer_name,
                total_cents, discount_cents, tax_cents,
                payment_type, currency, status, transaction_type,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13
            )
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.transaction_number)
        .bind(&transaction.customer_id)
        .bind(&transaction.customer_name)
        .bind(transaction.total_cents)
        .bind(transaction.discount_cents)
        .bind(transaction.tax_cents)
        .bind(transaction.payment_type)
        .bind(transaction.currency)
        .bind(transaction.status)
        .bind(transaction.transaction_type)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(DbError::from);

        match result {
            Ok(_) => return Ok(()),
            Err(e)
                if e.is_unique_violation_on("transaction_number")
                    && attempt < MAX_GENERATED_ID_ATTEMPTS =>
            {
                warn!(number = %transaction.transaction_number, attempt, "Transaction number taken, retrying");
                attempt += 1;
                transaction.transaction_number = transaction_number(kind, Utc::now());
            }
            Err(e) => {
                return Err(e.with_duplicate_value(
                    "transaction_number",
                    &transaction.transaction_number,
                ))
            }
        }
    }
}

async fn insert_item(conn: &mut SqliteConnection, item: &TransactionItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transaction_items (
            id, transaction_id, product_id, product_name,
            quantity, price_cents, total_cents, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8
        )
        "#,
    )
    .bind(&item.id)
    .bind(&item.transaction_id)
    .bind(&item.product_id)
    .bind(&item.product_name)
    .bind(item.quantity)
    .bind(item.price_cents)
    .bind(item.total_cents)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{file_db, memory_db};
    use crate::Database;
    use defter_core::{Currency, NewCustomer, NewProduct, NewTransaction};

    fn rate() -> ExchangeRate {
        ExchangeRate::from_whole(33)
    }

    async fn product(db: &Database, name: &str, price_cents: i64, quantity: i64) -> String {
        db.products()
            .create(NewProduct {
                name: name.to_string(),
                price_cents,
                quantity: Some(quantity),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    async fn customer(db: &Database) -> String {
        db.customers()
            .create(NewCustomer {
                name: "Ayşe Yılmaz".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    fn line(product_id: &str, quantity: i64) -> NewTransactionItem {
        NewTransactionItem {
            product_id: product_id.to_string(),
            quantity,
            ..Default::default()
        }
    }

    fn credit_invoice(customer_id: &str, items: Vec<NewTransactionItem>) -> CreateInvoice {
        CreateInvoice {
            transaction: NewTransaction {
                customer_id: Some(customer_id.to_string()),
                payment_type: Some(PaymentType::Credit),
                ..Default::default()
            },
            items,
        }
    }

    async fn debt(db: &Database, customer_id: &str) -> i64 {
        db.customers()
            .get_by_id(customer_id)
            .await
            .unwrap()
            .unwrap()
            .total_debt_cents
    }

    async fn stock(db: &Database, product_id: &str) -> i64 {
        db.products().get_by_id(product_id).await.unwrap().unwrap().quantity
    }

    #[tokio::test]
    async fn test_invoice_posts_lines_stock_and_debt() {
        let db = memory_db().await;
        let tea = product(&db, "Tea", 2_500, 10).await;
        let sugar = product(&db, "Sugar", 1_000, 4).await;
        let cust = customer(&db).await;

        let posted = db
            .transactions()
            .create_invoice(credit_invoice(&cust, vec![line(&tea, 2), line(&sugar, 5)]), rate())
            .await
            .unwrap();

        assert_eq!(posted.items.len(), 2);
        assert_eq!(posted.transaction.total_cents, 10_000);
        assert_eq!(posted.transaction.status, TransactionStatus::Pending);
        assert_eq!(posted.transaction.customer_name.as_deref(), Some("Ayşe Yılmaz"));
        assert!(posted.transaction.transaction_number.starts_with("INV-"));

        assert_eq!(stock(&db, &tea).await, 8);
        assert_eq!(stock(&db, &sugar).await, 0); // clamped, not -1
        assert_eq!(debt(&db, &cust).await, 10_000);

        let stored = db
            .transactions()
            .get_with_items(&posted.transaction.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.items.len(), 2);
        assert_eq!(stored.items[0].product_name, "Tea");
    }

    #[tokio::test]
    async fn test_usd_credit_sale_converts_debt() {
        let db = memory_db().await;
        let tea = product(&db, "Tea", 1_000, 10).await;
        let cust = customer(&db).await;

        let mut invoice = credit_invoice(&cust, vec![line(&tea, 1)]);
        invoice.transaction.currency = Some(Currency::Usd);
        db.transactions().create_invoice(invoice, rate()).await.unwrap();

        assert_eq!(debt(&db, &cust).await, 33_000);
    }

    #[tokio::test]
    async fn test_cash_sale_leaves_debt_alone() {
        let db = memory_db().await;
        let tea = product(&db, "Tea", 1_000, 10).await;
        let cust = customer(&db).await;

        let mut invoice = credit_invoice(&cust, vec![line(&tea, 1)]);
        invoice.transaction.payment_type = Some(PaymentType::Cash);
        invoice.transaction.discount_cents = Some(200);
        invoice.transaction.tax_cents = Some(50);
        let posted = db.transactions().create_invoice(invoice, rate()).await.unwrap();

        assert_eq!(posted.transaction.total_cents, 850);
        assert_eq!(posted.transaction.status, TransactionStatus::Completed);
        assert_eq!(debt(&db, &cust).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_back_everything() {
        let db = memory_db().await;
        let tea = product(&db, "Tea", 1_000, 10).await;
        let cust = customer(&db).await;

        let err = db
            .transactions()
            .create_invoice(credit_invoice(&cust, vec![line(&tea, 2), line("missing", 1)]), rate())
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Product"));
        assert_eq!(stock(&db, &tea).await, 10);
        assert_eq!(debt(&db, &cust).await, 0);
        assert!(db.transactions().list(None, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_customer_is_not_found() {
        let db = memory_db().await;
        let tea = product(&db, "Tea", 1_000, 10).await;

        let err = db
            .transactions()
            .create_invoice(credit_invoice("missing", vec![line(&tea, 1)]), rate())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Customer"));
    }

    #[tokio::test]
    async fn test_payment_scenario() {
        let db = memory_db().await;
        let tea = product(&db, "Tea", 10_000, 10).await;
        let cust = customer(&db).await;

        let sale = db
            .transactions()
            .create_invoice(credit_invoice(&cust, vec![line(&tea, 1)]), rate())
            .await
            .unwrap()
            .transaction;
        assert_eq!(debt(&db, &cust).await, 10_000);

        let pay = |amount_cents| PaymentRequest {
            amount_cents,
            transaction_id: sale.id.clone(),
            customer_id: cust.clone(),
        };

        // Pay 40 of 100
        let first = db.transactions().record_payment(pay(4_000), rate()).await.unwrap();
        assert_eq!(first.remaining_amount_cents, 6_000);
        assert_eq!(first.status, TransactionStatus::Pending);
        assert_eq!(first.collection.total_cents, -4_000);
        assert_eq!(first.collection.transaction_type, TransactionType::DebtCollection);
        assert!(first.collection.transaction_number.starts_with("PAY-"));
        assert_eq!(debt(&db, &cust).await, 6_000);

        // Overpay: rejected, nothing changes
        let err = db.transactions().record_payment(pay(8_000), rate()).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Overpayment { .. })));
        assert_eq!(debt(&db, &cust).await, 6_000);

        // Pay the remaining 60
        let second = db.transactions().record_payment(pay(6_000), rate()).await.unwrap();
        assert_eq!(second.remaining_amount_cents, 0);
        assert_eq!(second.status, TransactionStatus::Completed);
        assert_eq!(debt(&db, &cust).await, 0);

        let stored = db.transactions().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.total_cents, 0);
        assert_eq!(stored.status, TransactionStatus::Completed);

        let all = db.transactions().list(None, None, None).await.unwrap();
        let collections = all
            .iter()
            .filter(|t| t.transaction_type == TransactionType::DebtCollection)
            .count();
        assert_eq!(collections, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_credit_sales_on_file_database() {
        const SALES: i64 = 20;

        let file = file_db().await;
        let db = file.db.clone();
        let tea = product(&db, "Tea", 1_500, 1_000).await;
        let cust = customer(&db).await;

        let handles: Vec<_> = (0..SALES)
            .map(|_| {
                let db = db.clone();
                let invoice = credit_invoice(&cust, vec![line(&tea, 1)]);
                tokio::spawn(async move { db.transactions().create_invoice(invoice, rate()).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(debt(&db, &cust).await, SALES * 1_500);
        assert_eq!(stock(&db, &tea).await, 1_000 - SALES);
        let posted = db.transactions().list(Some(100), None, None).await.unwrap();
        assert_eq!(posted.len() as i64, SALES);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_payments_never_overpay() {
        let file = file_db().await;
        let db = file.db.clone();
        let tea = product(&db, "Tea", 1_000, 10).await;
        let cust = customer(&db).await;

        let sale = db
            .transactions()
            .create_invoice(credit_invoice(&cust, vec![line(&tea, 1)]), rate())
            .await
            .unwrap()
            .transaction;

        // 12 payments of 1.00 against an outstanding 10.00
        let handles: Vec<_> = (0..12)
            .map(|_| {
                let db = db.clone();
                let request = PaymentRequest {
                    amount_cents: 100,
                    transaction_id: sale.id.clone(),
                    customer_id: cust.clone(),
                };
                tokio::spawn(async move { db.transactions().record_payment(request, rate()).await })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(err) => assert!(matches!(err, DbError::Core(CoreError::Overpayment { .. }))),
            }
        }

        assert_eq!(accepted, 10);
        let stored = db.transactions().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.total_cents, 0);
        assert_eq!(stored.status, TransactionStatus::Completed);
        assert_eq!(debt(&db, &cust).await, 0);
    }

    #[tokio::test]
    async fn test_invoice_total_overflow_is_rejected() {
        let db = memory_db().await;
        let tea = product(&db, "Tea", 1_000, 10).await;
        let cust = customer(&db).await;

        // Largest accepted price on the maximum number of lines at maximum quantity
        let mut big = line(&tea, defter_core::MAX_ITEM_QUANTITY);
        big.price_cents = Some(defter_core::MAX_AMOUNT_CENTS);
        let mut invoice = credit_invoice(&cust, vec![big; 200]);
        invoice.transaction.currency = Some(Currency::Usd);

        let err = db.transactions().create_invoice(invoice, rate()).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::AmountOverflow { .. })));
        assert_eq!(debt(&db, &cust).await, 0);
        assert_eq!(stock(&db, &tea).await, 10);
    }

    #[tokio::test]
    async fn test_payment_by_other_customer_rejected() {
        let db = memory_db().await;
        let tea = product(&db, "Tea", 1_000, 10).await;
        let owner = customer(&db).await;
        let stranger = customer(&db).await;

        let sale = db
            .transactions()
            .create_invoice(credit_invoice(&owner, vec![line(&tea, 1)]), rate())
            .await
            .unwrap()
            .transaction;

        let err = db
            .transactions()
            .record_payment(
                PaymentRequest {
                    amount_cents: 100,
                    transaction_id: sale.id,
                    customer_id: stranger,
                },
                rate(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::CustomerMismatch { .. })));
    }

    #[tokio::test]
    async fn test_replace_items_restores_then_takes_stock() {
        let db = memory_db().await;
        let tea = product(&db, "Tea", 1_000, 10).await;
        let coffee = product(&db, "Coffee", 3_000, 10).await;
        let cust = customer(&db).await;

        let sale = db
            .transactions()
            .create_invoice(credit_invoice(&cust, vec![line(&tea, 4)]), rate())
            .await
            .unwrap()
            .transaction;
        assert_eq!(stock(&db, &tea).await, 6);

        let items = db
            .transactions()
            .replace_items(&sale.id, vec![line(&tea, 1), line(&coffee, 2)])
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(stock(&db, &tea).await, 9);
        assert_eq!(stock(&db, &coffee).await, 8);
        assert_eq!(db.transactions().items(&sale.id).await.unwrap().len(), 2);

        // Totals are left to patch()
        let stored = db.transactions().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.total_cents, 4_000);

        let patched = db
            .transactions()
            .patch(
                &sale.id,
                TransactionPatch {
                    total_cents: Some(7_000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.total_cents, 7_000);
        assert_eq!(patched.payment_type, PaymentType::Credit);
    }

    #[tokio::test]
    async fn test_list_search_and_paging() {
        let db = memory_db().await;
        let tea = product(&db, "Tea", 1_000, 100).await;

        for name in ["Ali", "Veli", "Ayşe"] {
            db.transactions()
                .create_invoice(
                    CreateInvoice {
                        transaction: NewTransaction {
                            customer_name: Some(name.to_string()),
                            ..Default::default()
                        },
                        items: vec![line(&tea, 1)],
                    },
                    rate(),
                )
                .await
                .unwrap();
        }

        let page = db.transactions().list(Some(2), Some(0), None).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].customer_name.as_deref(), Some("Ayşe"));

        let found = db.transactions().list(None, None, Some("veli")).await.unwrap();
        assert_eq!(found.len(), 1);

        assert!(matches!(
            db.transactions().items("missing").await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}

//! # Domain Types
//!
//! Core domain types used throughout Defter.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Supplier     │◄──│    Product      │◄──│ TransactionItem │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  product_id?    │       │
//! │  │  supplier_code  │   │  sku, barcode   │   │  product_name   │       │
//! │  │  name           │   │  quantity       │   │  quantity/price │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                       │ N              │
//! │  ┌─────────────────┐                      ┌───────────▼─────┐          │
//! │  │    Customer     │◄─────────────────────│   Transaction   │          │
//! │  │  ─────────────  │      customer_id?    │  ─────────────  │          │
//! │  │  total_debt     │                      │  number, total  │          │
//! │  │  (TRY, ≥ 0)     │                      │  type, status   │          │
//! │  └─────────────────┘                      └─────────────────┘          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, supplier_code, transaction_number) - human-readable
//!
//! ## JSON Shape
//! All types serialize with camelCase field names, the shape the frontend
//! forms send and read.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{major_units, Money};

// =============================================================================
// Currency
// =============================================================================

/// Currency of a price, a transaction or a debt balance.
///
/// Customer debt is always kept in TRY. USD amounts are converted with the
/// configured [`ExchangeRate`](crate::money::ExchangeRate) when they touch
/// the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Turkish lira.
    #[default]
    Try,
    /// US dollar.
    Usd,
}

impl Currency {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Currency::Try => "TRY",
            Currency::Usd => "USD",
        }
    }
}

// =============================================================================
// Payment Type
// =============================================================================

/// How a transaction is settled.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Paid on the spot.
    #[default]
    Cash,
    /// Sold on account: the total is added to the customer's debt.
    Credit,
    /// Audit row of a payment against an earlier credit sale.
    DebtCollection,
}

// =============================================================================
// Transaction Status
// =============================================================================

/// The status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Fully paid.
    Completed,
    /// Money still outstanding (credit sales until paid off).
    Pending,
    /// Cancelled or returned.
    Cancelled,
}

// =============================================================================
// Transaction Type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// An invoice with line items.
    #[default]
    Sale,
    /// A payment received against a sale.
    DebtCollection,
}

// =============================================================================
// Product
// =============================================================================

/// A product kept in inventory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on invoices.
    pub name: String,

    pub description: Option<String>,

    /// Stock Keeping Unit - business identifier, unique.
    pub sku: String,

    /// Barcode (EAN-13 etc.), unique when present.
    pub barcode: Option<String>,

    pub category: Option<String>,

    /// Sale price in cents of `currency`.
    pub price_cents: i64,

    /// Purchase cost in cents (for margin reports).
    pub cost_cents: Option<i64>,

    pub currency: Currency,

    /// Supplier this product is bought from.
    pub supplier_id: Option<String>,

    /// Units on hand. Never negative.
    pub quantity: i64,

    /// Reorder threshold: the product is "low stock" at or below it.
    pub min_quantity: i64,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// True when stock has dropped to the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_quantity
    }
}

/// Input for creating a product.
///
/// `quantity` sets the opening stock. After creation stock only moves
/// through invoice postings, so [`ProductUpdate`] has no such field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    /// Generated when absent.
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
    pub currency: Option<Currency>,
    pub supplier_id: Option<String>,
    pub quantity: Option<i64>,
    pub min_quantity: Option<i64>,
    pub is_active: Option<bool>,
}

/// Partial product update. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub cost_cents: Option<i64>,
    pub currency: Option<Currency>,
    pub supplier_id: Option<String>,
    pub min_quantity: Option<i64>,
    pub is_active: Option<bool>,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer who may buy on account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,

    /// Outstanding balance in kuruş. Only the ledger writes it.
    pub total_debt_cents: i64,

    /// Currency of `total_debt_cents`; TRY once the ledger touches it.
    pub debt_currency: Currency,

    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    #[inline]
    pub fn total_debt(&self) -> Money {
        Money::from_cents(self.total_debt_cents)
    }
}

/// Input for creating a customer. New customers start without debt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

/// Partial customer update. The debt balance is not editable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

// =============================================================================
// Supplier
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: String,
    /// Business identifier, unique (`SUP-001`).
    pub supplier_code: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_number: Option<String>,
    pub payment_terms: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplier {
    /// Generated as `SUP-NNN` when absent.
    pub supplier_code: Option<String>,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_number: Option<String>,
    pub payment_terms: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SupplierUpdate {
    pub supplier_code: Option<String>,
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_number: Option<String>,
    pub payment_terms: Option<String>,
    pub is_active: Option<bool>,
}

// =============================================================================
// Transaction
// =============================================================================

/// An invoice, or the audit record of a payment.
///
/// ## Lifecycle of a credit sale
/// ```text
/// POST /api/transactions (credit, 100.00)
///      │   status = pending, customer debt += 100.00
///      ▼
/// POST /api/payments (40.00)
///      │   total = 60.00, still pending, debt -= 40.00
///      │   + debt_collection row (total -40.00)
///      ▼
/// POST /api/payments (60.00)
///          total = 0, completed, debt -= 60.00
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    /// `INV-YYYYMMDD-XXXXXX` for sales, `PAY-...` for collections.
    pub transaction_number: String,
    /// Cleared when the customer is deleted.
    pub customer_id: Option<String>,
    /// Snapshot of the customer's name at posting time.
    pub customer_name: Option<String>,
    /// Outstanding total. Payments reduce it; collection rows are negative.
    pub total_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub payment_type: PaymentType,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub transaction_type: TransactionType,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line of an invoice.
/// Uses snapshot pattern to freeze product name and price at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    pub id: String,
    pub transaction_id: String,
    /// Cleared when the product is deleted; the snapshot stays.
    pub product_id: Option<String>,
    pub product_name: String,
    pub quantity: i64,
    pub price_cents: i64,
    /// price × quantity, computed server-side.
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Header fields of a new invoice.
///
/// `discount` and `tax` are read in major units (`12.5`), `discountCents`
/// and `taxCents` in cents.
#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub customer_id: Option<String>,
    /// Defaults to the customer's name.
    pub customer_name: Option<String>,
    pub discount_cents: Option<i64>,
    pub tax_cents: Option<i64>,
    pub payment_type: Option<PaymentType>,
    pub currency: Option<Currency>,
    /// Defaults to pending for credit sales, completed otherwise.
    pub status: Option<TransactionStatus>,
}

/// One line of a new invoice.
///
/// The price is read from `price` (major units) or `priceCents`.
#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionItem {
    pub product_id: String,
    pub quantity: i64,
    /// Defaults to the product's price.
    pub price_cents: Option<i64>,
    /// Defaults to the product's name.
    pub product_name: Option<String>,
}

/// Body of `POST /api/transactions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateInvoice {
    pub transaction: NewTransaction,
    pub items: Vec<NewTransactionItem>,
}

/// Direct overwrite of transaction header fields.
///
/// Used by the invoice editor after it replaced the items. No ledger side
/// effects. Amounts are accepted in major units (`total`) or cents
/// (`totalCents`).
#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    pub customer_name: Option<String>,
    pub total_cents: Option<i64>,
    pub discount_cents: Option<i64>,
    pub tax_cents: Option<i64>,
    pub payment_type: Option<PaymentType>,
    pub currency: Option<Currency>,
    pub status: Option<TransactionStatus>,
}

/// A transaction together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionWithItems {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
}

/// Query of `GET /api/transactions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub search: Option<String>,
}

// =============================================================================
// Payments
// =============================================================================

/// Body of `POST /api/payments`: pay (part of) one transaction.
///
/// Clients send `amount` in major units (`{"amount": 40, ...}`) or
/// `amountCents`.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount_cents: i64,
    pub transaction_id: String,
    pub customer_id: String,
}

/// Result of a payment against a transaction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub success: bool,
    /// What is still owed on the transaction.
    pub remaining_amount_cents: i64,
    pub amount_cents: i64,
    pub status: TransactionStatus,
    pub message: String,
    /// The debt_collection audit row.
    pub collection: Transaction,
}

/// Body of `POST /api/customers/{id}/payment`: reduce debt directly.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPaymentRequest {
    pub amount_cents: i64,
    pub currency: Option<Currency>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPaymentResult {
    pub success: bool,
    pub new_debt_cents: i64,
}

/// Debt of a customer compared against the credit limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DebtStatus {
    pub debt_cents: i64,
    pub currency: Currency,
    pub is_over_limit: bool,
    pub debt_in_usd_cents: i64,
    pub is_over_limit_usd: bool,
}

// =============================================================================
// Request Bodies
// =============================================================================
//
// Money fields of request bodies come in two spellings: the decimal amount
// (`amount`, `price`, ...) in major units, or the integer `...Cents` field.
// Each body is read into a wire struct first and then folded into the
// cents-only type. Unknown fields are rejected.

/// Picks the one spelling of a money field that was sent.
fn one_amount<E: de::Error>(
    name: &str,
    major: Option<i64>,
    cents: Option<i64>,
) -> Result<Option<i64>, E> {
    match (major, cents) {
        (Some(_), Some(_)) => Err(E::custom(format!(
            "`{name}` and `{name}Cents` are mutually exclusive"
        ))),
        (major, cents) => Ok(major.or(cents)),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct NewTransactionBody {
    customer_id: Option<String>,
    customer_name: Option<String>,
    #[serde(default, deserialize_with = "major_units::deserialize_option")]
    discount: Option<i64>,
    discount_cents: Option<i64>,
    #[serde(default, deserialize_with = "major_units::deserialize_option")]
    tax: Option<i64>,
    tax_cents: Option<i64>,
    payment_type: Option<PaymentType>,
    currency: Option<Currency>,
    status: Option<TransactionStatus>,
}

impl<'de> Deserialize<'de> for NewTransaction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let body = NewTransactionBody::deserialize(deserializer)?;
        Ok(NewTransaction {
            customer_id: body.customer_id,
            customer_name: body.customer_name,
            discount_cents: one_amount::<D::Error>("discount", body.discount, body.discount_cents)?,
            tax_cents: one_amount::<D::Error>("tax", body.tax, body.tax_cents)?,
            payment_type: body.payment_type,
            currency: body.currency,
            status: body.status,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct NewTransactionItemBody {
    product_id: String,
    quantity: i64,
    #[serde(default, deserialize_with = "major_units::deserialize_option")]
    price: Option<i64>,
    price_cents: Option<i64>,
    product_name: Option<String>,
}

impl<'de> Deserialize<'de> for NewTransactionItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let body = NewTransactionItemBody::deserialize(deserializer)?;
        Ok(NewTransactionItem {
            product_id: body.product_id,
            quantity: body.quantity,
            price_cents: one_amount::<D::Error>("price", body.price, body.price_cents)?,
            product_name: body.product_name,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct TransactionPatchBody {
    customer_name: Option<String>,
    #[serde(default, deserialize_with = "major_units::deserialize_option")]
    total: Option<i64>,
    total_cents: Option<i64>,
    #[serde(default, deserialize_with = "major_units::deserialize_option")]
    discount: Option<i64>,
    discount_cents: Option<i64>,
    #[serde(default, deserialize_with = "major_units::deserialize_option")]
    tax: Option<i64>,
    tax_cents: Option<i64>,
    payment_type: Option<PaymentType>,
    currency: Option<Currency>,
    status: Option<TransactionStatus>,
}

impl<'de> Deserialize<'de> for TransactionPatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let body = TransactionPatchBody::deserialize(deserializer)?;
        Ok(TransactionPatch {
            customer_name: body.customer_name,
            total_cents: one_amount::<D::Error>("total", body.total, body.total_cents)?,
            discount_cents: one_amount::<D::Error>("discount", body.discount, body.discount_cents)?,
            tax_cents: one_amount::<D::Error>("tax", body.tax, body.tax_cents)?,
            payment_type: body.payment_type,
            currency: body.currency,
            status: body.status,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PaymentBody {
    #[serde(default, deserialize_with = "major_units::deserialize_option")]
    amount: Option<i64>,
    amount_cents: Option<i64>,
    transaction_id: String,
    customer_id: String,
}

impl<'de> Deserialize<'de> for PaymentRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let body = PaymentBody::deserialize(deserializer)?;
        let amount_cents = one_amount::<D::Error>("amount", body.amount, body.amount_cents)?
            .ok_or_else(|| <D::Error as de::Error>::missing_field("amount"))?;
        Ok(PaymentRequest {
            amount_cents,
            transaction_id: body.transaction_id,
            customer_id: body.customer_id,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CustomerPaymentBody {
    #[serde(default, deserialize_with = "major_units::deserialize_option")]
    amount: Option<i64>,
    amount_cents: Option<i64>,
    currency: Option<Currency>,
}

impl<'de> Deserialize<'de> for CustomerPaymentRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let body = CustomerPaymentBody::deserialize(deserializer)?;
        let amount_cents = one_amount::<D::Error>("amount", body.amount, body.amount_cents)?
            .ok_or_else(|| <D::Error as de::Error>::missing_field("amount"))?;
        Ok(CustomerPaymentRequest {
            amount_cents,
            currency: body.currency,
        })
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Figures shown on the dashboard cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    /// Completed sales of the current month, in kuruş.
    pub total_sales_cents: i64,
    pub total_orders: i64,
    pub active_products: i64,
    pub new_customers: i64,
    pub low_stock_count: i64,
    pub pending_orders: i64,
    pub active_customers: i64,
    pub returns: i64,
}

/// One sale of a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesHistoryEntry {
    pub transaction_id: String,
    pub transaction_number: String,
    pub customer_name: Option<String>,
    pub quantity: i64,
    pub price_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSalesHistory {
    pub total_quantity_sold: i64,
    pub total_sales_cents: i64,
    pub sales_history: Vec<SalesHistoryEntry>,
}

impl ProductSalesHistory {
    /// Builds the summary from history rows, newest first.
    pub fn from_entries(sales_history: Vec<SalesHistoryEntry>) -> Self {
        let total_quantity_sold = sales_history.iter().map(|e| e.quantity).sum();
        let total_sales_cents = sales_history.iter().map(|e| e.total_cents).sum();
        ProductSalesHistory {
            total_quantity_sold,
            total_sales_cents,
            sales_history,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

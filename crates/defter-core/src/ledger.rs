//! # Ledger Rules
//!
//! Pure rules of the customer debt ledger and of invoice totals.
//!
//! ## Debt Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Customer Debt (TRY)                             │
//! │                                                                         │
//! │   credit sale ──► credit_debt_delta() ──► debt += total × rate          │
//! │                                                                         │
//! │   payment ──────► apply_payment() ──────► transaction total -= amount   │
//! │                                           debt = max(0, debt - amount)  │
//! │                                                                         │
//! │   direct payment ─────────────────────── debt = max(0, debt - amount)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The functions here decide WHAT changes. defter-db applies the decision
//! with atomic SQL inside one database transaction.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{ExchangeRate, Money};
use crate::types::{
    Currency, DebtStatus, PaymentType, Transaction, TransactionStatus, TransactionType,
};

// =============================================================================
// Credit Posting
// =============================================================================

/// Amount (in TRY) a new transaction adds to its customer's debt.
///
/// Only credit sales with a positive total touch the ledger. Fails when the
/// TRY amount does not fit in an `i64`.
///
/// ## Example
/// ```rust
/// use defter_core::ledger::credit_debt_delta;
/// use defter_core::money::{ExchangeRate, Money};
/// use defter_core::types::{Currency, PaymentType};
///
/// let rate = ExchangeRate::from_whole(33);
/// let delta = credit_debt_delta(PaymentType::Credit, Money::from_cents(1000), Currency::Usd, rate);
/// assert_eq!(delta.unwrap(), Some(Money::from_cents(33_000)));
///
/// let cash = credit_debt_delta(PaymentType::Cash, Money::from_cents(1000), Currency::Try, rate);
/// assert_eq!(cash.unwrap(), None);
/// ```
pub fn credit_debt_delta(
    payment_type: PaymentType,
    total: Money,
    currency: Currency,
    rate: ExchangeRate,
) -> CoreResult<Option<Money>> {
    if payment_type != PaymentType::Credit || !total.is_positive() {
        return Ok(None);
    }
    converted(rate, total, currency, "debt posting").map(Some)
}

/// `rate.to_try` with overflow reported as [`CoreError::AmountOverflow`].
pub fn converted(
    rate: ExchangeRate,
    amount: Money,
    currency: Currency,
    context: &str,
) -> CoreResult<Money> {
    rate.to_try(amount, currency)
        .ok_or_else(|| CoreError::AmountOverflow {
            context: context.to_string(),
        })
}

/// Status a new invoice gets when the client does not send one.
#[inline]
pub fn default_status(payment_type: PaymentType) -> TransactionStatus {
    match payment_type {
        PaymentType::Credit => TransactionStatus::Pending,
        PaymentType::Cash | PaymentType::DebtCollection => TransactionStatus::Completed,
    }
}

// =============================================================================
// Payment Application
// =============================================================================

/// What a payment does to a transaction and to its customer's debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentOutcome {
    /// Transaction total after the payment.
    pub remaining: Money,
    /// `Completed` when nothing is left, `Pending` otherwise.
    pub status: TransactionStatus,
    /// Amount to take off the customer's debt, in TRY.
    pub debt_reduction: Money,
}

/// Checks a payment against a transaction and computes its effect.
///
/// ## Rules
/// - amount must be positive
/// - the transaction must be a sale owned by `customer_id`
/// - cancelled sales take no payments
/// - amount must not exceed the outstanding total
///
/// ## Example
/// ```text
/// outstanding 100.00, pay 40.00 → remaining 60.00, pending
/// outstanding  60.00, pay 60.00 → remaining  0.00, completed
/// outstanding  60.00, pay 80.00 → Overpayment
/// ```
pub fn apply_payment(
    transaction: &Transaction,
    customer_id: &str,
    amount: Money,
    rate: ExchangeRate,
) -> CoreResult<PaymentOutcome> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amountCents".to_string(),
        }
        .into());
    }

    if transaction.transaction_type == TransactionType::DebtCollection {
        return Err(CoreError::NotPayable {
            transaction_number: transaction.transaction_number.clone(),
            reason: "it is a payment record".to_string(),
        });
    }

    if transaction.status == TransactionStatus::Cancelled {
        return Err(CoreError::NotPayable {
            transaction_number: transaction.transaction_number.clone(),
            reason: "it is cancelled".to_string(),
        });
    }

    if transaction.customer_id.as_deref() != Some(customer_id) {
        return Err(CoreError::CustomerMismatch {
            transaction_number: transaction.transaction_number.clone(),
            customer_id: customer_id.to_string(),
        });
    }

    let outstanding = transaction.total();
    if amount > outstanding {
        return Err(CoreError::Overpayment {
            transaction_number: transaction.transaction_number.clone(),
            outstanding_cents: outstanding.cents(),
            requested_cents: amount.cents(),
        });
    }

    let remaining = outstanding - amount;
    let status = if remaining.is_zero() {
        TransactionStatus::Completed
    } else {
        TransactionStatus::Pending
    };

    Ok(PaymentOutcome {
        remaining,
        status,
        debt_reduction: converted(rate, amount, transaction.currency, "debt reduction")?,
    })
}

// =============================================================================
// Debt Limits
// =============================================================================

/// Credit limits a customer's debt is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebtLimits {
    pub try_limit: Money,
    pub usd_limit: Money,
}

impl Default for DebtLimits {
    fn default() -> Self {
        DebtLimits {
            try_limit: Money::from_major(5_000),
            usd_limit: Money::from_major(150),
        }
    }
}

/// Reports a debt balance in TRY and USD against the limits.
///
/// A debt equal to a limit counts as over the limit.
///
/// ## Example
/// ```rust
/// use defter_core::ledger::{debt_status, DebtLimits};
/// use defter_core::money::{ExchangeRate, Money};
///
/// let status = debt_status(Money::from_major(5_000), ExchangeRate::from_whole(33), DebtLimits::default());
/// assert!(status.is_over_limit);
/// assert_eq!(status.debt_in_usd_cents, 15_152);
/// ```
pub fn debt_status(debt: Money, rate: ExchangeRate, limits: DebtLimits) -> DebtStatus {
    // Past the i64 range the debt is over any limit anyway.
    let debt_in_usd = rate
        .try_to_usd(debt)
        .unwrap_or(Money::from_cents(i64::MAX));
    DebtStatus {
        debt_cents: debt.cents(),
        currency: Currency::Try,
        is_over_limit: debt >= limits.try_limit,
        debt_in_usd_cents: debt_in_usd.cents(),
        is_over_limit_usd: debt_in_usd >= limits.usd_limit,
    }
}

// =============================================================================
// Invoice Totals
// =============================================================================

/// Totals of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

/// total = Σ line totals − discount + tax, never negative.
///
/// Sums that leave the `i64` range fail with [`CoreError::AmountOverflow`].
///
/// ## Example
/// ```rust
/// use defter_core::ledger::invoice_totals;
/// use defter_core::money::Money;
///
/// let lines = [Money::from_cents(1000), Money::from_cents(500)];
/// let totals = invoice_totals(&lines, Money::from_cents(200), Money::from_cents(100)).unwrap();
/// assert_eq!(totals.total.cents(), 1400);
/// ```
pub fn invoice_totals(line_totals: &[Money], discount: Money, tax: Money) -> CoreResult<InvoiceTotals> {
    let overflow = || CoreError::AmountOverflow {
        context: "invoice total".to_string(),
    };
    let subtotal = Money::checked_sum(line_totals.iter().copied()).ok_or_else(overflow)?;
    let total = subtotal
        .checked_sub(discount)
        .and_then(|t| t.checked_add(tax))
        .ok_or_else(overflow)?;

    if total.is_negative() {
        return Err(CoreError::NegativeTotal {
            subtotal_cents: subtotal.cents(),
            discount_cents: discount.cents(),
            tax_cents: tax.cents(),
        });
    }

    Ok(InvoiceTotals {
        subtotal,
        discount,
        tax,
        total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Validation Module
//!
//! Input validation for every payload the API accepts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend forms                                                │
//! │  └── Immediate user feedback                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                           │
//! │  ├── Type validation (JSON deserialization)                             │
//! │  └── THIS MODULE: field rules, all failures collected                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── NOT NULL / CHECK constraints                                       │
//! │  ├── UNIQUE constraints (sku, barcode, supplier_code)                   │
//! │  └── Foreign key constraints                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use defter_core::types::NewCustomer;
//! use defter_core::validation::Validate;
//!
//! let customer = NewCustomer { name: "Ayşe Yılmaz".to_string(), ..Default::default() };
//! assert!(customer.validate().is_ok());
//!
//! let nameless = NewCustomer::default();
//! let errors = nameless.validate().unwrap_err();
//! assert_eq!(errors.errors()[0].field(), "name");
//! ```

use crate::error::{ValidationError, ValidationErrors};
use crate::types::{
    CreateInvoice, CustomerPaymentRequest, CustomerUpdate, NewCustomer, NewProduct, NewSupplier,
    NewTransactionItem, PaymentRequest, PaymentType, ProductUpdate, SupplierUpdate,
    TransactionPatch,
};
use crate::{MAX_AMOUNT_CENTS, MAX_INVOICE_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_CODE_LEN: usize = 50;
const MAX_TEXT_LEN: usize = 1000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU or other business code (supplier code, barcode).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use defter_core::validation::validate_code;
///
/// assert!(validate_code("sku", "SUP-001-004").is_ok());
/// assert!(validate_code("sku", "").is_err());
/// assert!(validate_code("sku", "has space").is_err());
/// ```
pub fn validate_code(field: &str, code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if code.len() > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (product, customer, supplier).
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates optional free text (description, address, payment terms).
pub fn validate_text(field: &str, text: &str) -> ValidationResult<()> {
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        });
    }
    Ok(())
}

/// Validates an email address. Empty strings count as "no email".
///
/// ## Example
/// ```rust
/// use defter_core::validation::validate_email;
///
/// assert!(validate_email("email", "info@example.com").is_ok());
/// assert!(validate_email("email", "").is_ok());
/// assert!(validate_email("email", "nobody").is_err());
/// ```
pub fn validate_email(field: &str, email: &str) -> ValidationResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Ok(());
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid || email.contains(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be an email address".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query, `None` when it is empty.
pub fn validate_search_query(query: &str) -> ValidationResult<Option<String>> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    if query.is_empty() {
        Ok(None)
    } else {
        Ok(Some(query.to_string()))
    }
}

/// Validates a reference to another entity (`productId`, `customerId`).
pub fn validate_reference(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an invoice line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock level or threshold (zero allowed).
pub fn validate_stock(field: &str, qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an amount in cents that may be zero (prices, discounts, tax).
///
/// ## Example
/// ```rust
/// use defter_core::validation::validate_cents;
///
/// assert!(validate_cents("priceCents", 1099).is_ok());
/// assert!(validate_cents("priceCents", 0).is_ok());     // Free item
/// assert!(validate_cents("priceCents", -100).is_err());
/// assert!(validate_cents("priceCents", 5_000_000_000_000_000_000).is_err());
/// ```
pub fn validate_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

/// Validates a payment amount in cents: zero or negative payments are refused.
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amountCents".to_string(),
        });
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "amountCents".to_string(),
            min: 1,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

// =============================================================================
// Payload Validation
// =============================================================================

/// A request payload that can check itself.
///
/// Implementations run every check and report all failures at once.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

fn check_opt<T: ?Sized, F>(errors: &mut ValidationErrors, value: Option<&T>, check: F)
where
    F: FnOnce(&T) -> ValidationResult<()>,
{
    if let Some(value) = value {
        errors.check(check(value));
    }
}

impl Validate for NewProduct {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_name("name", &self.name));
        check_opt(&mut errors, self.sku.as_deref(), |s| validate_code("sku", s));
        check_opt(&mut errors, self.barcode.as_deref(), |s| validate_code("barcode", s));
        check_opt(&mut errors, self.description.as_deref(), |s| validate_text("description", s));
        check_opt(&mut errors, self.category.as_deref(), |s| validate_name("category", s));
        errors.check(validate_cents("priceCents", self.price_cents));
        check_opt(&mut errors, self.cost_cents.as_ref(), |c| validate_cents("costCents", *c));
        check_opt(&mut errors, self.quantity.as_ref(), |q| validate_stock("quantity", *q));
        check_opt(&mut errors, self.min_quantity.as_ref(), |q| {
            validate_stock("minQuantity", *q)
        });
        errors.into_result()
    }
}

impl Validate for ProductUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_opt(&mut errors, self.name.as_deref(), |s| validate_name("name", s));
        check_opt(&mut errors, self.sku.as_deref(), |s| validate_code("sku", s));
        check_opt(&mut errors, self.barcode.as_deref(), |s| validate_code("barcode", s));
        check_opt(&mut errors, self.description.as_deref(), |s| validate_text("description", s));
        check_opt(&mut errors, self.category.as_deref(), |s| validate_name("category", s));
        check_opt(&mut errors, self.price_cents.as_ref(), |c| validate_cents("priceCents", *c));
        check_opt(&mut errors, self.cost_cents.as_ref(), |c| validate_cents("costCents", *c));
        check_opt(&mut errors, self.min_quantity.as_ref(), |q| {
            validate_stock("minQuantity", *q)
        });
        errors.into_result()
    }
}

impl Validate for NewCustomer {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_name("name", &self.name));
        check_opt(&mut errors, self.email.as_deref(), |s| validate_email("email", s));
        check_opt(&mut errors, self.phone.as_deref(), |s| validate_text("phone", s));
        check_opt(&mut errors, self.address.as_deref(), |s| validate_text("address", s));
        errors.into_result()
    }
}

impl Validate for CustomerUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_opt(&mut errors, self.name.as_deref(), |s| validate_name("name", s));
        check_opt(&mut errors, self.email.as_deref(), |s| validate_email("email", s));
        check_opt(&mut errors, self.phone.as_deref(), |s| validate_text("phone", s));
        check_opt(&mut errors, self.address.as_deref(), |s| validate_text("address", s));
        errors.into_result()
    }
}

impl Validate for NewSupplier {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_name("name", &self.name));
        check_opt(&mut errors, self.supplier_code.as_deref(), |s| {
            validate_code("supplierCode", s)
        });
        check_opt(&mut errors, self.contact_person.as_deref(), |s| {
            validate_text("contactPerson", s)
        });
        check_opt(&mut errors, self.email.as_deref(), |s| validate_email("email", s));
        check_opt(&mut errors, self.address.as_deref(), |s| validate_text("address", s));
        check_opt(&mut errors, self.payment_terms.as_deref(), |s| {
            validate_text("paymentTerms", s)
        });
        errors.into_result()
    }
}

impl Validate for SupplierUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_opt(&mut errors, self.name.as_deref(), |s| validate_name("name", s));
        check_opt(&mut errors, self.supplier_code.as_deref(), |s| {
            validate_code("supplierCode", s)
        });
        check_opt(&mut errors, self.email.as_deref(), |s| validate_email("email", s));
        check_opt(&mut errors, self.address.as_deref(), |s| validate_text("address", s));
        check_opt(&mut errors, self.payment_terms.as_deref(), |s| {
            validate_text("paymentTerms", s)
        });
        errors.into_result()
    }
}

impl Validate for NewTransactionItem {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_reference("productId", &self.product_id));
        errors.check(validate_quantity("quantity", self.quantity));
        check_opt(&mut errors, self.price_cents.as_ref(), |c| validate_cents("priceCents", *c));
        check_opt(&mut errors, self.product_name.as_deref(), |s| {
            validate_name("productName", s)
        });
        errors.into_result()
    }
}

/// Validates a set of replacement lines (`PUT /api/transactions/{id}/items`).
///
/// An empty list is allowed there: it clears the invoice.
pub fn validate_items(items: &[NewTransactionItem]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if items.len() > MAX_INVOICE_ITEMS {
        errors.push(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_INVOICE_ITEMS as i64,
        });
    }
    for (i, item) in items.iter().enumerate() {
        if let Err(nested) = item.validate() {
            errors.extend_nested(&format!("items[{}]", i), nested);
        }
    }
    errors.into_result()
}

impl Validate for CreateInvoice {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let header = &self.transaction;

        let has_customer_id = header
            .customer_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty());
        let has_customer_name = header
            .customer_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty());
        if !has_customer_id && !has_customer_name {
            errors.push(ValidationError::Required {
                field: "transaction.customerName".to_string(),
            });
        }

        if header.payment_type == Some(PaymentType::DebtCollection) {
            errors.push(ValidationError::InvalidFormat {
                field: "transaction.paymentType".to_string(),
                reason: "debt_collection is reserved for payments".to_string(),
            });
        }

        check_opt(&mut errors, header.discount_cents.as_ref(), |c| {
            validate_cents("transaction.discountCents", *c)
        });
        check_opt(&mut errors, header.tax_cents.as_ref(), |c| {
            validate_cents("transaction.taxCents", *c)
        });

        if self.items.is_empty() {
            errors.push(ValidationError::Empty {
                field: "items".to_string(),
            });
        }
        if let Err(nested) = validate_items(&self.items) {
            for err in nested.errors() {
                errors.push(err.clone());
            }
        }

        errors.into_result()
    }
}

impl Validate for TransactionPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_opt(&mut errors, self.customer_name.as_deref(), |s| {
            validate_name("customerName", s)
        });
        check_opt(&mut errors, self.total_cents.as_ref(), |c| validate_cents("totalCents", *c));
        check_opt(&mut errors, self.discount_cents.as_ref(), |c| {
            validate_cents("discountCents", *c)
        });
        check_opt(&mut errors, self.tax_cents.as_ref(), |c| validate_cents("taxCents", *c));
        errors.into_result()
    }
}

impl Validate for PaymentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_payment_amount(self.amount_cents));
        errors.check(validate_reference("transactionId", &self.transaction_id));
        errors.check(validate_reference("customerId", &self.customer_id));
        errors.into_result()
    }
}

impl Validate for CustomerPaymentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_payment_amount(self.amount_cents));
        errors.into_result()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

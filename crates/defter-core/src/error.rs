//! # Error Types
//!
//! Domain-specific error types for defter-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  defter-core errors (this file)                                        │
//! │  ├── CoreError         - Business rule violations                      │
//! │  ├── ValidationError   - One failed field check                        │
//! │  └── ValidationErrors  - All failed field checks of one payload        │
//! │                                                                         │
//! │  defter-db errors (separate crate)                                     │
//! │  └── DbError           - Database operation failures                   │
//! │                                                                         │
//! │  defter-api errors                                                     │
//! │  └── ApiError          - HTTP status + JSON body                       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Frontend     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Payment larger than what is still owed on the transaction.
    ///
    /// ## When This Occurs
    /// ```text
    /// Invoice INV-20261017-K3J9QX outstanding: 60.00
    ///      │
    ///      ▼
    /// Payment of 80.00
    ///      │
    ///      ▼
    /// Overpayment { outstanding_cents: 6000, requested_cents: 8000 }
    /// ```
    #[error("Payment of {requested_cents} exceeds outstanding total {outstanding_cents} on {transaction_number}")]
    Overpayment {
        transaction_number: String,
        outstanding_cents: i64,
        requested_cents: i64,
    },

    /// The transaction cannot receive payments (debt collections, cancelled sales).
    #[error("Transaction {transaction_number} cannot receive payments: {reason}")]
    NotPayable {
        transaction_number: String,
        reason: String,
    },

    /// Payment names a customer that does not own the transaction.
    #[error("Transaction {transaction_number} does not belong to customer {customer_id}")]
    CustomerMismatch {
        transaction_number: String,
        customer_id: String,
    },

    /// Discount pushed the invoice total below zero.
    #[error("Invoice total cannot be negative (subtotal {subtotal_cents}, discount {discount_cents}, tax {tax_cents})")]
    NegativeTotal {
        subtotal_cents: i64,
        discount_cents: i64,
        tax_cents: i64,
    },

    /// Money arithmetic left the representable range.
    #[error("{context} is too large to compute")]
    AmountOverflow { context: String },

    /// Validation error (wraps every failed field check).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),
}

impl From<ValidationError> for CoreError {
    fn from(err: ValidationError) -> Self {
        CoreError::Validation(ValidationErrors::from(err))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Every variant names the offending field so the API can report
/// field-level detail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Collection has no elements.
    #[error("{field} must not be empty")]
    Empty { field: String },
}

impl ValidationError {
    /// Returns the name of the field that failed validation.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::Negative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::Empty { field } => field,
        }
    }
}

// =============================================================================
// Validation Errors (collection)
// =============================================================================

/// Every failed check of one payload.
///
/// Payload validation keeps going after the first failure so the form can
/// highlight all bad fields at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Creates an empty collection.
    pub fn new() -> Self {
        ValidationErrors::default()
    }

    /// Records the error of a failed check, ignores a passed one.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(err) = result {
            self.errors.push(err);
        }
    }

    /// Records an error unconditionally.
    pub fn push(&mut self, err: ValidationError) {
        self.errors.push(err);
    }

    /// Copies the errors of a nested payload, prefixing their field names.
    ///
    /// `items[2]` + `quantity` becomes `items[2].quantity`.
    pub fn extend_nested(&mut self, prefix: &str, nested: ValidationErrors) {
        for err in nested.errors {
            let field = format!("{}.{}", prefix, err.field());
            self.errors.push(rename_field(err, field));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// `Ok(())` when nothing failed, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        ValidationErrors { errors: vec![err] }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn rename_field(err: ValidationError, field: String) -> ValidationError {
    match err {
        ValidationError::Required { .. } => ValidationError::Required { field },
        ValidationError::TooLong { max, .. } => ValidationError::TooLong { field, max },
        ValidationError::OutOfRange { min, max, .. } => {
            ValidationError::OutOfRange { field, min, max }
        }
        ValidationError::MustBePositive { .. } => ValidationError::MustBePositive { field },
        ValidationError::Negative { .. } => ValidationError::Negative { field },
        ValidationError::InvalidFormat { reason, .. } => {
            ValidationError::InvalidFormat { field, reason }
        }
        ValidationError::Empty { .. } => ValidationError::Empty { field },
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::Overpayment {
            transaction_number: "INV-20261017-ABC123".to_string(),
            outstanding_cents: 6000,
            requested_cents: 8000,
        };
        assert_eq!(
            err.to_string(),
            "Payment of 8000 exceeds outstanding total 6000 on INV-20261017-ABC123"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn test_collection_keeps_every_failure() {
        let mut errors = ValidationErrors::new();
        errors.check(Ok(()));
        errors.check(Err(ValidationError::Required {
            field: "name".to_string(),
        }));
        errors.push(ValidationError::Negative {
            field: "priceCents".to_string(),
        });

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            "name is required; priceCents must not be negative"
        );
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_nested_fields_are_prefixed() {
        let mut inner = ValidationErrors::new();
        inner.push(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });

        let mut outer = ValidationErrors::new();
        outer.extend_nested("items[2]", inner);

        assert_eq!(outer.errors()[0].field(), "items[2].quantity");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sku".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(ref e) if e.len() == 1));
    }
}

//! # Business Identifiers
//!
//! Generators for the human-readable identifiers: transaction numbers,
//! product SKUs and supplier codes.
//!
//! ```text
//! INV-20261017-K3J9QX   sale, UTC date + 6 random base-36 chars
//! PAY-20261017-7TQ0ZA   debt collection, same shape
//! SUP-004               fourth supplier
//! SUP-004-012           twelfth product of SUP-004
//! TEA-261017-4821       product without supplier (name prefix, YYMMDD, 4 digits)
//! ```
//!
//! Uniqueness is enforced by the database. Random identifiers can collide,
//! so callers retry the insert with a fresh value on a unique violation.

use chrono::{DateTime, Utc};
use rand::Rng;

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of the random tail of a transaction number.
pub const TRANSACTION_SUFFIX_LEN: usize = 6;

/// Kind of transaction a number is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    /// `INV-` prefix.
    Invoice,
    /// `PAY-` prefix.
    Collection,
}

impl NumberKind {
    pub const fn prefix(&self) -> &'static str {
        match self {
            NumberKind::Invoice => "INV",
            NumberKind::Collection => "PAY",
        }
    }
}

/// Generates `PREFIX-YYYYMMDD-XXXXXX` for the given instant.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use defter_core::numbering::{transaction_number, NumberKind};
///
/// let at = Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0).unwrap();
/// let number = transaction_number(NumberKind::Invoice, at);
/// assert!(number.starts_with("INV-20261017-"));
/// assert_eq!(number.len(), 19);
/// ```
pub fn transaction_number(kind: NumberKind, at: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..TRANSACTION_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}-{}", kind.prefix(), at.format("%Y%m%d"), suffix)
}

/// Generates the next supplier code from the current supplier count.
///
/// ```rust
/// use defter_core::numbering::supplier_code;
/// assert_eq!(supplier_code(3), "SUP-004");
/// ```
pub fn supplier_code(existing_suppliers: i64) -> String {
    format!("SUP-{:03}", existing_suppliers + 1)
}

/// SKU of a supplier's next product.
///
/// ```rust
/// use defter_core::numbering::supplier_product_sku;
/// assert_eq!(supplier_product_sku("SUP-004", 11), "SUP-004-012");
/// ```
pub fn supplier_product_sku(supplier_code: &str, existing_products: i64) -> String {
    format!("{}-{:03}", supplier_code, existing_products + 1)
}

/// SKU of a product without a (known) supplier.
///
/// Prefix is the first three alphanumeric characters of the name in upper
/// case, `PRD` when the name has none.
pub fn standalone_sku(name: &str, at: DateTime<Utc>) -> String {
    let mut prefix: String = name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .take(3)
        .flat_map(char::to_uppercase)
        .collect();
    if prefix.is_empty() {
        prefix = "PRD".to_string();
    }

    let digits: u16 = rand::thread_rng().gen_range(1000..10000);
    format!("{}-{}-{}", prefix, at.format("%y%m%d"), digits)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 23, 59, 0).unwrap()
    }

    #[test]
    fn test_transaction_number_shape() {
        let number = transaction_number(NumberKind::Collection, at());
        let parts: Vec<&str> = number.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "PAY");
        assert_eq!(parts[1], "20261017");
        assert_eq!(parts[2].len(), TRANSACTION_SUFFIX_LEN);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_supplier_codes() {
        assert_eq!(supplier_code(0), "SUP-001");
        assert_eq!(supplier_code(999), "SUP-1000");
        assert_eq!(supplier_product_sku("SUP-001", 0), "SUP-001-001");
    }

    #[test]
    fn test_standalone_sku() {
        let sku = standalone_sku("tea glass", at());
        assert!(sku.starts_with("TEA-261017-"));
        let digits = sku.rsplit('-').next().unwrap();
        assert_eq!(digits.len(), 4);

        assert!(standalone_sku("  -- ", at()).starts_with("PRD-"));
        assert!(standalone_sku("a b", at()).starts_with("AB-"));
    }
}

//! # Money Module
//!
//! Provides the `Money` type and the USD→TRY `ExchangeRate`.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A debt ledger adds and subtracts thousands of such values:             │
//! │    every credit sale and every payment drifts the balance a little      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (cents / kuruş)                      │
//! │    ₺100.00 = 10000, $4.99 = 499                                         │
//! │    Conversion rounds exactly once, at a known place                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use defter_core::money::{ExchangeRate, Money};
//! use defter_core::types::Currency;
//!
//! let price = Money::from_cents(1099);
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.cents(), 3297);
//!
//! let rate: ExchangeRate = "33.50".parse().unwrap();
//! assert_eq!(rate.to_try(Money::from_cents(200), Currency::Usd), Some(Money::from_cents(6700)));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::types::Currency;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// `Money` carries no currency of its own. The owning record (product,
/// transaction, customer) stores the currency next to the amount.
///
/// ## Where Money is Used
/// ```text
/// Product.price_cents ──► TransactionItem.price_cents ──► item total
///                                                            │
///                         Σ items − discount + tax ◄─────────┘
///                                    │
///                                    ▼
///                         Transaction.total_cents ──► Customer.total_debt_cents
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use defter_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use defter_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// `self + other`, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `self - other`, or `None` on overflow.
    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Line total `self × qty`, or `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use defter_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(299).checked_multiply_quantity(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sums amounts, or `None` if the sum leaves the `i64` range.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Parses a decimal amount in major units ("40", "12.5", "-3.99") into cents.
    ///
    /// At most two fraction digits are accepted; nothing is rounded.
    ///
    /// ## Example
    /// ```rust
    /// use defter_core::money::Money;
    ///
    /// assert_eq!(Money::parse_major("40").unwrap().cents(), 4000);
    /// assert_eq!(Money::parse_major("19.99").unwrap().cents(), 1999);
    /// assert_eq!(Money::parse_major("0.5").unwrap().cents(), 50);
    /// assert!(Money::parse_major("1.999").is_err());
    /// ```
    pub fn parse_major(s: &str) -> Result<Money, ParseMoneyError> {
        let err = || ParseMoneyError(s.to_string());
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));

        if whole.is_empty()
            || frac.len() > 2
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(err());
        }

        let whole: i64 = whole.parse().map_err(|_| err())?;
        let frac: i64 = if frac.is_empty() {
            0
        } else {
            format!("{:0<2}", frac).parse().map_err(|_| err())?
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(err)?;
        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Subtracts and clamps the result at zero.
    ///
    /// Debt balances never go negative: paying more than the recorded
    /// debt leaves the customer at zero.
    ///
    /// ## Example
    /// ```rust
    /// use defter_core::money::Money;
    ///
    /// let debt = Money::from_cents(5000);
    /// assert_eq!(debt.saturating_sub_floor(Money::from_cents(8000)).cents(), 0);
    /// ```
    #[inline]
    pub fn saturating_sub_floor(&self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented display ("123.45"). The frontend formats for users.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    #[inline]
    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Money) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Money;

    #[inline]
    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Money) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Money;

    #[inline]
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl From<i64> for Money {
    #[inline]
    fn from(cents: i64) -> Self {
        Money(cents)
    }
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// Scale of [`ExchangeRate`]: four decimal places.
pub const RATE_SCALE: i64 = 10_000;

/// Number of TRY per 1 USD, as a fixed-point value with four decimals.
///
/// ## Representation
/// ```text
/// 33       TRY/USD → 330000
/// 33.25    TRY/USD → 332500
/// 32.1234  TRY/USD → 321234
/// ```
///
/// The rate is configuration, loaded once at startup and passed into every
/// ledger operation. Business code never holds a literal rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExchangeRate(i64);

impl ExchangeRate {
    /// Creates a rate from a whole number of TRY per USD.
    #[inline]
    pub const fn from_whole(try_per_usd: i64) -> Self {
        ExchangeRate(try_per_usd * RATE_SCALE)
    }

    /// Creates a rate from its scaled representation (`33.25` = `332500`).
    #[inline]
    pub const fn from_scaled(scaled: i64) -> Self {
        ExchangeRate(scaled)
    }

    #[inline]
    pub const fn scaled(&self) -> i64 {
        self.0
    }

    /// Converts an amount in `currency` to TRY.
    ///
    /// TRY amounts pass through unchanged. USD amounts are multiplied by the
    /// rate and rounded half away from zero to whole kuruş. `None` when the
    /// result does not fit in an `i64`.
    ///
    /// ## Example
    /// ```rust
    /// use defter_core::money::{ExchangeRate, Money};
    /// use defter_core::types::Currency;
    ///
    /// let rate = ExchangeRate::from_whole(33);
    /// assert_eq!(rate.to_try(Money::from_cents(150), Currency::Usd), Some(Money::from_cents(4950)));
    /// assert_eq!(rate.to_try(Money::from_cents(150), Currency::Try), Some(Money::from_cents(150)));
    /// ```
    pub fn to_try(&self, amount: Money, currency: Currency) -> Option<Money> {
        match currency {
            Currency::Try => Some(amount),
            Currency::Usd => div_round(amount.cents() as i128 * self.0 as i128, RATE_SCALE as i128)
                .map(Money::from_cents),
        }
    }

    /// Converts a TRY amount to USD, rounding half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use defter_core::money::{ExchangeRate, Money};
    ///
    /// let rate = ExchangeRate::from_whole(33);
    /// assert_eq!(rate.try_to_usd(Money::from_cents(330_000)), Some(Money::from_cents(10_000)));
    /// ```
    pub fn try_to_usd(&self, amount: Money) -> Option<Money> {
        if self.0 == 0 {
            return Some(Money::zero());
        }
        div_round(amount.cents() as i128 * RATE_SCALE as i128, self.0 as i128).map(Money::from_cents)
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        ExchangeRate::from_whole(33)
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:04}", self.0 / RATE_SCALE, self.0 % RATE_SCALE)
    }
}

/// Error returned when parsing an [`ExchangeRate`] fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid exchange rate '{0}': expected a positive decimal with at most 4 fraction digits")]
pub struct ParseRateError(pub String);

impl FromStr for ExchangeRate {
    type Err = ParseRateError;

    /// Parses "33", "33.5" or "33.2500".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRateError(s.to_string());
        let trimmed = s.trim();
        let (whole, frac) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };

        if whole.is_empty()
            || frac.len() > 4
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(err());
        }

        let whole: i64 = whole.parse().map_err(|_| err())?;
        let frac_scaled: i64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<4}", frac);
            padded.parse().map_err(|_| err())?
        };

        let scaled = whole
            .checked_mul(RATE_SCALE)
            .and_then(|w| w.checked_add(frac_scaled))
            .ok_or_else(err)?;

        if scaled <= 0 {
            return Err(err());
        }
        Ok(ExchangeRate(scaled))
    }
}

/// Error returned when parsing a decimal amount fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid amount '{0}': expected a decimal with at most 2 fraction digits")]
pub struct ParseMoneyError(pub String);

/// Integer division rounding half away from zero; `None` outside the `i64` range.
fn div_round(numerator: i128, denominator: i128) -> Option<i64> {
    let half = denominator / 2;
    let rounded = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    };
    i64::try_from(rounded).ok()
}

// =============================================================================
// Major-Unit Deserialization
// =============================================================================

/// Deserializes an optional amount written in major units (`40`, `12.5`,
/// `"19.99"`) into cents.
///
/// Used for request fields such as `amount` and `price`, which clients send
/// as decimal currency values.
pub mod major_units {
    use serde::de::{self, Deserializer, Visitor};
    use std::fmt;

    use super::Money;

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(OptionVisitor)
    }

    struct OptionVisitor;

    impl<'de> Visitor<'de> for OptionVisitor {
        type Value = Option<i64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a decimal amount or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_any(AmountVisitor).map(Some)
        }
    }

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a decimal amount with at most 2 fraction digits")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            v.checked_mul(100)
                .ok_or_else(|| E::custom(format!("amount {v} is out of range")))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v)
                .ok()
                .and_then(|v| v.checked_mul(100))
                .ok_or_else(|| E::custom(format!("amount {v} is out of range")))
        }

        // `{}` prints the shortest decimal that reads back as `v`, so 19.99
        // stays "19.99" and is parsed exactly.
        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            if !v.is_finite() {
                return Err(E::custom("amount must be a finite number"));
            }
            self.visit_str(&format!("{v}"))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            Money::parse_major(v).map(|m| m.cents()).map_err(E::custom)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);

        assert_eq!((a + b).cents(), 1250);
        assert_eq!((a - b).cents(), 750);
        assert_eq!((-b).cents(), -250);
        assert_eq!(Money::from_major(12).cents(), 1200);
    }

    #[test]
    fn test_sum_of_lines() {
        let lines = vec![Money::from_cents(100), Money::from_cents(250), Money::from_cents(5)];
        let total: Money = lines.into_iter().sum();
        assert_eq!(total.cents(), 355);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(7).to_string(), "0.07");
    }

    #[test]
    fn test_usd_conversion_rounds_half_away_from_zero() {
        let rate: ExchangeRate = "33.25".parse().unwrap();
        // 0.01 USD * 33.25 = 0.3325 TRY -> 33.25 kuruş -> 33
        assert_eq!(rate.to_try(Money::from_cents(1), Currency::Usd), Some(Money::from_cents(33)));
        // 0.02 USD * 33.25 = 66.5 kuruş -> 67
        assert_eq!(rate.to_try(Money::from_cents(2), Currency::Usd), Some(Money::from_cents(67)));
        assert_eq!(rate.to_try(Money::from_cents(-2), Currency::Usd), Some(Money::from_cents(-67)));
    }

    #[test]
    fn test_try_is_identity() {
        let rate = ExchangeRate::from_whole(33);
        let amount = Money::from_cents(12_345);
        assert_eq!(rate.to_try(amount, Currency::Try), Some(amount));
    }

    #[test]
    fn test_try_to_usd() {
        let rate = ExchangeRate::from_whole(33);
        assert_eq!(rate.try_to_usd(Money::from_cents(500_000)), Some(Money::from_cents(15_152)));
    }

    #[test]
    fn test_conversion_out_of_range() {
        let rate = ExchangeRate::from_whole(33);
        let huge = Money::from_cents(i64::MAX / 10);
        assert_eq!(rate.to_try(huge, Currency::Usd), None);
        assert_eq!(rate.to_try(huge, Currency::Try), Some(huge));
        assert_eq!(ExchangeRate::from_scaled(1).try_to_usd(huge), None);
    }

    #[test]
    fn test_checked_arithmetic() {
        let big = Money::from_cents(5_000_000_000_000_000_000);
        assert_eq!(big.checked_add(big), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(Money::checked_sum([big, big]), None);
        assert_eq!(
            Money::checked_sum([Money::from_cents(100), Money::from_cents(250)]),
            Some(Money::from_cents(350))
        );
    }

    #[test]
    fn test_parse_major() {
        assert_eq!(Money::parse_major("40").unwrap().cents(), 4_000);
        assert_eq!(Money::parse_major("40.5").unwrap().cents(), 4_050);
        assert_eq!(Money::parse_major("-3.99").unwrap().cents(), -399);
        assert!(Money::parse_major("").is_err());
        assert!(Money::parse_major("1.234").is_err());
        assert!(Money::parse_major("1e3").is_err());
        assert!(Money::parse_major("99999999999999999999").is_err());
    }

    #[derive(Debug, serde::Deserialize)]
    struct Priced {
        #[serde(default, deserialize_with = "major_units::deserialize_option")]
        price: Option<i64>,
    }

    #[test]
    fn test_major_units_deserialize() {
        let read = |json: &str| serde_json::from_str::<Priced>(json).map(|p| p.price);

        assert_eq!(read(r#"{"price": 100}"#).unwrap(), Some(10_000));
        assert_eq!(read(r#"{"price": 19.99}"#).unwrap(), Some(1_999));
        assert_eq!(read(r#"{"price": "0.10"}"#).unwrap(), Some(10));
        assert_eq!(read(r#"{"price": null}"#).unwrap(), None);
        assert_eq!(read(r#"{}"#).unwrap(), None);
        assert!(read(r#"{"price": 1.005}"#).is_err());
        assert!(read(r#"{"price": 5e18}"#).is_err());
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!("33".parse::<ExchangeRate>().unwrap().scaled(), 330_000);
        assert_eq!("33.5".parse::<ExchangeRate>().unwrap().scaled(), 335_000);
        assert_eq!(" 32.1234 ".parse::<ExchangeRate>().unwrap().scaled(), 321_234);
        assert_eq!(ExchangeRate::from_scaled(335_000).to_string(), "33.5000");

        assert!("".parse::<ExchangeRate>().is_err());
        assert!("0".parse::<ExchangeRate>().is_err());
        assert!("-3".parse::<ExchangeRate>().is_err());
        assert!("33.12345".parse::<ExchangeRate>().is_err());
        assert!("abc".parse::<ExchangeRate>().is_err());
    }

    #[test]
    fn test_saturating_sub_floor() {
        let debt = Money::from_cents(6000);
        assert_eq!(debt.saturating_sub_floor(Money::from_cents(4000)).cents(), 2000);
        assert_eq!(debt.saturating_sub_floor(Money::from_cents(9000)).cents(), 0);
    }
}

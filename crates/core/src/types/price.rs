//! Type-safe price representation using decimal arithmetic.
//!
//! Menu prices, line totals and delivery fees all share one currency, so a
//! price is a plain decimal amount in the currency's standard unit (dollars,
//! not cents). Floating point never touches money.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount.
///
/// Deserializes from either a JSON number (`8.99`) or a string (`"8.99"`),
/// serializes as a string to keep the exact decimal representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an amount in cents (`899` is `8.99`).
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Formats as a dollar amount rounded to cents, e.g. `$8.99`.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0.round_dp(2))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(899).amount(), Decimal::new(899, 2));
        assert_eq!(Price::from_cents(-150).amount(), Decimal::new(-150, 2));
    }

    #[test]
    fn test_times_and_sum() {
        let lines = [Price::from_cents(12_000).times(2), Price::from_cents(15_000).times(1)];
        let total: Price = lines.into_iter().sum();
        assert_eq!(total, Price::new(Decimal::from(390)));
    }

    #[test]
    fn test_display_rounds_to_cents() {
        assert_eq!(Price::from_cents(299).to_string(), "$2.99");
        assert_eq!(Price::new(Decimal::from(5)).to_string(), "$5.00");
    }

    #[test]
    fn test_deserializes_numbers_and_strings() {
        let from_number: Price = serde_json::from_str("8.99").unwrap();
        let from_string: Price = serde_json::from_str("\"8.99\"").unwrap();
        assert_eq!(from_number, Price::from_cents(899));
        assert_eq!(from_string, Price::from_cents(899));
    }
}

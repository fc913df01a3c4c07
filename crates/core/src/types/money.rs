//! Monetary amounts using decimal arithmetic.
//!
//! The backend reports prices as JSON numbers. They are parsed into
//! [`rust_decimal::Decimal`] so cart totals never accumulate binary floating
//! point error.

use core::fmt;
use core::iter::Sum;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when constructing [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is below zero.
    #[error("amount must not be negative: {0}")]
    Negative(Decimal),
    /// The input is not a decimal number.
    #[error("not a decimal amount: {0:?}")]
    Unparsable(String),
}

/// A non-negative monetary amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount, rejecting negative values.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` if `amount < 0`.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Get the underlying decimal.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let amount = Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .map_err(|_| MoneyError::Unparsable(s.to_owned()))?;
        Self::new(amount)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.fold(Decimal::ZERO, |acc, m| acc.saturating_add(m.0)))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// A catalog price as listed by the backend.
///
/// Catalog data is not validated server-side, so a product can arrive with a
/// price that is missing, negative or not a number. Those are kept as
/// [`ListedPrice::Unparsable`] instead of failing the whole catalog load; the
/// price filter excludes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ListedPrice {
    /// A valid non-negative amount.
    Amount(Money),
    /// The raw value that could not be read as an amount.
    Unparsable(String),
}

impl ListedPrice {
    /// The amount, if the listed value was a valid price.
    #[must_use]
    pub const fn amount(&self) -> Option<Money> {
        match self {
            Self::Amount(money) => Some(*money),
            Self::Unparsable(_) => None,
        }
    }
}

impl From<Money> for ListedPrice {
    fn from(value: Money) -> Self {
        Self::Amount(value)
    }
}

impl<'de> Deserialize<'de> for ListedPrice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let text = match &raw {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Ok(match (&raw, text.parse::<Money>()) {
            (serde_json::Value::Number(_) | serde_json::Value::String(_), Ok(money)) => {
                Self::Amount(money)
            }
            _ => Self::Unparsable(text),
        })
    }
}

impl fmt::Display for ListedPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(money) => money.fmt(f),
            Self::Unparsable(_) => f.write_str("N/A"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            Money::new(Decimal::new(-1, 0)),
            Err(MoneyError::Negative(_))
        ));
        assert!("-0.01".parse::<Money>().is_err());
    }

    #[test]
    fn test_times_and_sum_are_exact() {
        let total: Money = [money("0.10").times(3), money("0.20")].into_iter().sum();
        assert_eq!(total, money("0.50"));
    }

    #[test]
    fn test_deserialize_from_json_number() {
        let m: Money = serde_json::from_str("19.99").unwrap();
        assert_eq!(m.to_string(), "19.99");
        assert!(serde_json::from_str::<Money>("-5").is_err());
    }

    #[test]
    fn test_listed_price_variants() {
        let ok: ListedPrice = serde_json::from_str("100").unwrap();
        assert_eq!(ok.amount(), Some(money("100")));

        let text: ListedPrice = serde_json::from_str("\" 49.50 \"").unwrap();
        assert_eq!(text.amount(), Some(money("49.50")));

        let bad: ListedPrice = serde_json::from_str("\"call us\"").unwrap();
        assert_eq!(bad, ListedPrice::Unparsable("call us".to_string()));

        let null: ListedPrice = serde_json::from_str("null").unwrap();
        assert_eq!(null.amount(), None);

        let negative: ListedPrice = serde_json::from_str("-3").unwrap();
        assert_eq!(negative.amount(), None);
    }
}

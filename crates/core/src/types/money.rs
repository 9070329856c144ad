//! Monetary amounts using decimal arithmetic.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Money`] amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is zero or negative where a positive amount is required.
    #[error("amount must be greater than zero")]
    NotPositive,
    /// The amount is negative.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount does not fit the payment provider's minor-unit integer.
    #[error("amount is out of range")]
    OutOfRange,
}

/// A non-negative amount in the store currency's standard unit (e.g. euros).
///
/// Serialized as a JSON number; accepts both numbers and strings on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a non-negative amount.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` for negative input.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Ok(Self(amount.normalize()))
    }

    /// Create a strictly positive amount (order totals, payment intents).
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::NotPositive` for zero or negative input.
    pub fn positive(amount: Decimal) -> Result<Self, MoneyError> {
        if amount <= Decimal::ZERO {
            return Err(MoneyError::NotPositive);
        }
        Ok(Self(amount.normalize()))
    }

    /// Create an amount from minor units (cents).
    #[must_use]
    pub fn from_minor(minor: u32) -> Self {
        Self(Decimal::new(i64::from(minor), 2).normalize())
    }

    /// The underlying decimal.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Convert to the integer minor-unit amount payment providers expect.
    ///
    /// Truncates sub-minor precision, matching how card processors interpret
    /// a decimal amount multiplied by the currency exponent.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::OutOfRange` if the result does not fit an `i64`.
    pub fn to_minor_units(&self, currency: CurrencyCode) -> Result<i64, MoneyError> {
        let factor = Decimal::from(10_i64.pow(currency.exponent()));
        let minor = (self.0 * factor).trunc();
        minor.to_i64().ok_or(MoneyError::OutOfRange)
    }
}

impl core::ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self((self.0 + rhs.0).normalize())
    }
}

impl core::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, m| acc + m)
    }
}

impl Serialize for Money {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0.to_f64().unwrap_or_default())
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| MoneyError::OutOfRange)?;
        Self::new(amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// ISO 4217 currency codes accepted by the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EUR,
    USD,
    GBP,
    CHF,
    JPY,
}

impl CurrencyCode {
    /// Number of minor-unit digits.
    #[must_use]
    pub const fn exponent(self) -> u32 {
        match self {
            Self::JPY => 0,
            Self::EUR | Self::USD | Self::GBP | Self::CHF => 2,
        }
    }

    /// Uppercase ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EUR => "EUR",
            Self::USD => "USD",
            Self::GBP => "GBP",
            Self::CHF => "CHF",
            Self::JPY => "JPY",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::EUR => "€",
            Self::USD => "$",
            Self::GBP => "£",
            Self::CHF => "CHF",
            Self::JPY => "¥",
        }
    }

    /// Format an amount for display, e.g. `€12.50`.
    #[must_use]
    pub fn format(self, money: Money) -> String {
        format!("{}{money}", self.symbol())
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Self::EUR),
            "USD" => Ok(Self::USD),
            "GBP" => Ok(Self::GBP),
            "CHF" => Ok(Self::CHF),
            "JPY" => Ok(Self::JPY),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_positive_rejects_zero_and_negative() {
        assert_eq!(Money::positive(Decimal::ZERO), Err(MoneyError::NotPositive));
        assert_eq!(Money::positive(dec("-1")), Err(MoneyError::NotPositive));
        assert!(Money::positive(dec("0.01")).is_ok());
    }

    #[test]
    fn test_new_allows_zero() {
        assert!(Money::new(Decimal::ZERO).unwrap().is_zero());
        assert_eq!(Money::new(dec("-0.5")), Err(MoneyError::Negative));
    }

    #[test]
    fn test_minor_units() {
        let m = Money::positive(dec("12.349")).unwrap();
        assert_eq!(m.to_minor_units(CurrencyCode::EUR).unwrap(), 1234);
        assert_eq!(m.to_minor_units(CurrencyCode::JPY).unwrap(), 12);
    }

    #[test]
    fn test_sum_and_display() {
        let total: Money = [Money::from_minor(1500), Money::from_minor(250)]
            .into_iter()
            .sum();
        assert_eq!(total.to_string(), "17.50");
        assert_eq!(CurrencyCode::EUR.format(total), "€17.50");
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let a: Money = serde_json::from_str("15").unwrap();
        let b: Money = serde_json::from_str("\"15.00\"").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<Money>("-3").is_err());
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_value(Money::from_minor(1250)).unwrap();
        assert_eq!(json, serde_json::json!(12.5));
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("eur".parse::<CurrencyCode>().unwrap(), CurrencyCode::EUR);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}

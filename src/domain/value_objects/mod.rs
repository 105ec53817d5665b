//! Value Objects for the storefront

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest discount code the catalog accepts.
pub const MAX_DISCOUNT_CODE_LEN: usize = 32;

/// Discount code value object.
///
/// Codes are compared case-insensitively, so the stored form is always the
/// trimmed, upper-cased token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiscountCode(String);

impl DiscountCode {
    pub fn new(value: impl AsRef<str>) -> Result<Self, DiscountCodeError> {
        let value = value.as_ref().trim().to_uppercase();
        if value.is_empty() { return Err(DiscountCodeError::Empty); }
        if value.len() > MAX_DISCOUNT_CODE_LEN { return Err(DiscountCodeError::TooLong(value.len())); }
        if value.chars().any(char::is_whitespace) { return Err(DiscountCodeError::Whitespace); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for DiscountCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl TryFrom<String> for DiscountCode {
    type Error = DiscountCodeError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<DiscountCode> for String {
    fn from(code: DiscountCode) -> Self { code.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscountCodeError {
    #[error("discount code is empty")]
    Empty,
    #[error("discount code exceeds {} characters", MAX_DISCOUNT_CODE_LEN)]
    TooLong(usize),
    #[error("discount code contains whitespace")]
    Whitespace,
}

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn inr(amount: Decimal) -> Self { Self::new(amount, "INR") }
    pub fn units(units: i64, currency: &str) -> Self { Self::new(Decimal::from(units), currency) }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn is_zero(&self) -> bool { self.amount.is_zero() }

    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }

    /// Subtracts `other`, flooring the result at zero.
    pub fn saturating_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Money::new((self.amount - other.amount).max(Decimal::ZERO), &self.currency))
    }

    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount * Decimal::from(qty), &self.currency) }

    pub fn scale(&self, factor: Decimal) -> Money { Money::new(self.amount * factor, &self.currency) }

    /// `percent` of this amount, e.g. `percent_of(10)` on 1000 is 100.
    pub fn percent_of(&self, percent: Decimal) -> Money {
        Money::new(self.amount * percent / Decimal::ONE_HUNDRED, &self.currency)
    }

    /// Rounds to whole currency units, halves away from zero.
    pub fn round_units(&self) -> Money {
        Money::new(self.amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero), &self.currency)
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch { expected: self.currency.clone(), got: other.currency.clone() });
        }
        Ok(())
    }
}

impl Default for Money { fn default() -> Self { Self::zero("INR") } }

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {}", self.currency, self.amount.normalize()) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_code_normalized() {
        let code = DiscountCode::new("  save10 ").unwrap();
        assert_eq!(code.as_str(), "SAVE10");
        assert_eq!(code, DiscountCode::new("SAVE10").unwrap());
    }

    #[test]
    fn test_discount_code_rejects_garbage() {
        assert_eq!(DiscountCode::new("   "), Err(DiscountCodeError::Empty));
        assert_eq!(DiscountCode::new("SAVE 10"), Err(DiscountCodeError::Whitespace));
        assert!(matches!(DiscountCode::new("X".repeat(40)), Err(DiscountCodeError::TooLong(40))));
    }

    #[test]
    fn test_money_add() {
        let a = Money::inr(Decimal::new(100, 0));
        let b = Money::inr(Decimal::new(50, 0));
        assert_eq!(a.add(&b).unwrap().amount(), Decimal::new(150, 0));
        assert!(a.add(&Money::units(1, "USD")).is_err());
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        let a = Money::units(300, "INR");
        assert_eq!(a.saturating_sub(&Money::units(500, "INR")).unwrap(), Money::zero("INR"));
        assert_eq!(a.saturating_sub(&Money::units(100, "INR")).unwrap(), Money::units(200, "INR"));
    }

    #[test]
    fn test_round_units_half_away_from_zero() {
        assert_eq!(Money::inr(Decimal::new(10625, 1)).round_units(), Money::units(1063, "INR"));
        assert_eq!(Money::inr(Decimal::new(10624, 1)).round_units(), Money::units(1062, "INR"));
    }

    #[test]
    fn test_percent_of_keeps_fraction() {
        let price = Money::units(2999, "INR");
        assert_eq!(price.percent_of(Decimal::from(15)).amount(), Decimal::new(44985, 2));
    }
}

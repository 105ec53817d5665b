//! Discount codes and the catalog they are looked up in

use std::collections::HashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use crate::domain::value_objects::{DiscountCode, DiscountCodeError, Money};

/// What a code is worth. Built-in codes set exactly one of the two fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRule {
    #[serde(default)]
    pub percentage: Decimal,
    #[serde(default)]
    pub flat_amount: Decimal,
}

impl DiscountRule {
    pub fn percent(percentage: u32) -> Result<Self, DiscountError> {
        Self { percentage: Decimal::from(percentage), flat_amount: Decimal::ZERO }.validated()
    }

    pub fn flat(amount: i64) -> Result<Self, DiscountError> {
        Self { percentage: Decimal::ZERO, flat_amount: Decimal::from(amount) }.validated()
    }

    fn validated(self) -> Result<Self, DiscountError> {
        if self.percentage < Decimal::ZERO || self.percentage > Decimal::ONE_HUNDRED {
            return Err(DiscountError::PercentageOutOfRange(self.percentage));
        }
        if self.flat_amount < Decimal::ZERO { return Err(DiscountError::NegativeAmount(self.flat_amount)); }
        Ok(self)
    }
}

/// A code applied to a cart, snapshotted into orders at checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub code: DiscountCode,
    pub percentage: Decimal,
    pub flat_amount: Decimal,
}

impl Discount {
    pub fn new(code: DiscountCode, rule: DiscountRule) -> Self {
        Self { code, percentage: rule.percentage, flat_amount: rule.flat_amount }
    }

    /// Price of `total` after this discount.
    ///
    /// A positive percentage wins; otherwise the flat amount is taken off and
    /// the result floored at zero.
    pub fn apply(&self, total: &Money) -> Money {
        if self.percentage > Decimal::ZERO {
            return Money::new(total.amount() - total.percent_of(self.percentage).amount(), total.currency());
        }
        Money::new((total.amount() - self.flat_amount).max(Decimal::ZERO), total.currency())
    }
}

/// Code → rule table injected into the cart.
///
/// Deserializing goes through [`DiscountCatalog::insert`], so every rule in a
/// loaded table has passed validation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, DiscountRule>", into = "HashMap<String, DiscountRule>")]
pub struct DiscountCatalog { rules: HashMap<DiscountCode, DiscountRule> }

impl DiscountCatalog {
    pub fn empty() -> Self { Self::default() }

    /// Codes the storefront ships with.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for (code, rule) in [
            ("SAVE10", DiscountRule::percent(10)),
            ("SAVE20", DiscountRule::percent(20)),
            ("FLAT500", DiscountRule::flat(500)),
            ("WELCOME15", DiscountRule::percent(15)),
            ("NEWUSER", DiscountRule::percent(25)),
        ] {
            if let Err(e) = rule.and_then(|rule| catalog.insert(code, rule)) {
                warn!(code, "skipping built-in discount: {e}");
            }
        }
        catalog
    }

    pub fn from_json(json: &str) -> Result<Self, DiscountError> {
        let raw: HashMap<String, DiscountRule> = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    pub fn insert(&mut self, code: &str, rule: DiscountRule) -> Result<(), DiscountError> {
        let code = DiscountCode::new(code)?;
        self.rules.insert(code, rule.validated()?);
        Ok(())
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, code: &str) -> Option<Discount> {
        let code = DiscountCode::new(code).ok()?;
        let rule = *self.rules.get(&code)?;
        Some(Discount::new(code, rule))
    }

    pub fn len(&self) -> usize { self.rules.len() }
    pub fn is_empty(&self) -> bool { self.rules.is_empty() }
}

impl TryFrom<HashMap<String, DiscountRule>> for DiscountCatalog {
    type Error = DiscountError;
    fn try_from(raw: HashMap<String, DiscountRule>) -> Result<Self, Self::Error> {
        let mut catalog = Self::empty();
        for (code, rule) in raw { catalog.insert(&code, rule)?; }
        Ok(catalog)
    }
}

impl From<DiscountCatalog> for HashMap<String, DiscountRule> {
    fn from(catalog: DiscountCatalog) -> Self {
        catalog.rules.into_iter().map(|(code, rule)| (code.into(), rule)).collect()
    }
}

#[derive(Debug, Error)]
pub enum DiscountError {
    #[error("percentage {0} outside 0..=100")]
    PercentageOutOfRange(Decimal),
    #[error("flat amount {0} is negative")]
    NegativeAmount(Decimal),
    #[error(transparent)]
    Code(#[from] DiscountCodeError),
    #[error("malformed discount table: {0}")]
    Malformed(#[from] serde_json::Error),
}

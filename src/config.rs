//! Environment-driven configuration

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use rust_decimal::Decimal;
use thiserror::Error;
use crate::domain::aggregates::{Catalog, CheckoutPolicy, DiscountCatalog, PaymentMethod};
use crate::payment::PaymentTiming;
use crate::Result;

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub discounts_path: Option<PathBuf>,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment: PaymentTiming,
    pub policy: CheckoutPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".quicksell"),
            catalog_path: PathBuf::from("data/catalog.json"),
            discounts_path: None,
            currency: "INR".to_string(),
            payment_method: PaymentMethod::Card,
            payment: PaymentTiming::default(),
            policy: CheckoutPolicy::default(),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> std::result::Result<Self, ConfigError> { Self::from_lookup(|key| std::env::var(key).ok()) }

    /// Builds the config from any key/value source, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> std::result::Result<Self, ConfigError> {
        let defaults = Self::default();
        let step_ms: u64 = parse_or(&lookup, "QUICKSELL_PAYMENT_STEP_MS", 1000)?;
        let settle_ms: u64 = parse_or(&lookup, "QUICKSELL_PAYMENT_SETTLE_MS", 500)?;
        let tax_rate: Decimal = parse_or(&lookup, "QUICKSELL_TAX_RATE", defaults.policy.tax_rate)?;
        if tax_rate < Decimal::ZERO {
            return Err(ConfigError::Invalid { key: "QUICKSELL_TAX_RATE", value: tax_rate.to_string() });
        }
        Ok(Self {
            data_dir: lookup("QUICKSELL_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            catalog_path: lookup("QUICKSELL_CATALOG").map(PathBuf::from).unwrap_or(defaults.catalog_path),
            discounts_path: lookup("QUICKSELL_DISCOUNTS").map(PathBuf::from),
            currency: lookup("QUICKSELL_CURRENCY").map(|c| c.trim().to_uppercase()).unwrap_or(defaults.currency),
            payment_method: parse_or(&lookup, "QUICKSELL_PAYMENT_METHOD", defaults.payment_method)?,
            payment: PaymentTiming { step: Duration::from_millis(step_ms), settle: Duration::from_millis(settle_ms) },
            policy: CheckoutPolicy {
                card_surcharge: parse_or(&lookup, "QUICKSELL_CARD_SURCHARGE", defaults.policy.card_surcharge)?,
                tax_rate,
                ..defaults.policy
            },
        })
    }

    pub fn orders_path(&self) -> PathBuf { self.data_dir.join("orders.json") }
    pub fn session_path(&self) -> PathBuf { self.data_dir.join("session.json") }

    pub fn load_catalog(&self) -> Result<Catalog> {
        let raw = std::fs::read_to_string(&self.catalog_path)
            .map_err(|source| ConfigError::Unreadable { path: self.catalog_path.clone(), source })?;
        Ok(Catalog::from_json(&raw)?)
    }

    /// The configured discount table, or the built-in codes when none is set.
    pub fn load_discounts(&self) -> Result<DiscountCatalog> {
        let Some(path) = &self.discounts_path else { return Ok(DiscountCatalog::builtin()) };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable { path: path.clone(), source })?;
        Ok(DiscountCatalog::from_json(&raw)?)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> std::result::Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
    #[error("cannot read {}: {source}", path.display())]
    Unreadable { path: PathBuf, source: std::io::Error },
}

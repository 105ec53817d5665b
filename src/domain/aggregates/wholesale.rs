//! Bulk pricing for wholesale buyers

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use crate::domain::aggregates::product::Product;
use crate::domain::value_objects::Money;

/// Smallest wholesale order accepted.
pub const MIN_ORDER_UNITS: u32 = 50;
/// Units at or above which the 20% tier applies.
pub const MID_TIER_UNITS: u32 = 50;
/// Units at or above which the 30% tier applies.
pub const TOP_TIER_UNITS: u32 = 100;

pub fn tier_percent(quantity: u32) -> Decimal {
    match quantity {
        q if q >= TOP_TIER_UNITS => Decimal::from(30),
        q if q >= MID_TIER_UNITS => Decimal::from(20),
        _ => Decimal::from(10),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WholesaleQuote {
    pub product_id: String,
    pub quantity: u32,
    pub discount_percent: Decimal,
    pub unit_price: Money,
    pub unit_gst: Money,
    pub order_value: Money,
}

impl WholesaleQuote {
    /// Quotes `quantity` units of `product` with GST charged on the discounted unit price.
    /// Orders below [`MIN_ORDER_UNITS`] are refused.
    pub fn for_quantity(product: &Product, quantity: u32, gst_rate: Decimal) -> Result<Self, WholesaleError> {
        if quantity < MIN_ORDER_UNITS {
            return Err(WholesaleError::BelowMinimum { quantity, minimum: MIN_ORDER_UNITS });
        }
        let discount_percent = tier_percent(quantity);
        let unit_price = product.price.scale((Decimal::ONE_HUNDRED - discount_percent) / Decimal::ONE_HUNDRED);
        let unit_gst = unit_price.scale(gst_rate);
        let order_value = Money::new(unit_price.amount() + unit_gst.amount(), unit_price.currency()).multiply(quantity);
        Ok(Self { product_id: product.id.clone(), quantity, discount_percent, unit_price, unit_gst, order_value })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WholesaleError {
    #[error("wholesale orders need at least {minimum} units, got {quantity}")]
    BelowMinimum { quantity: u32, minimum: u32 },
}

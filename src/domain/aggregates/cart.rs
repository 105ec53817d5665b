//! Cart Aggregate
//!
//! Every mutation recomputes `total` from the line items and
//! `discounted_total` from `total`, so neither can drift.

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use crate::domain::aggregates::discount::{Discount, DiscountCatalog};
use crate::domain::aggregates::product::Product;
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::Money;

/// A product line. `1 <= quantity <= product.stock` always holds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    pub fn product_id(&self) -> &str { &self.product.id }
    pub fn line_total(&self) -> Money { self.product.price.multiply(self.quantity) }
}

/// Frozen copy of the cart handed to checkout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub total: Money,
    pub discount: Option<Discount>,
    pub discounted_total: Money,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

#[derive(Clone, Debug)]
pub struct Cart {
    items: Vec<CartItem>,
    total: Money,
    discount: Option<Discount>,
    discounted_total: Money,
    currency: String,
    discounts: Arc<DiscountCatalog>,
    events: Vec<DomainEvent>,
}

impl Cart {
    pub fn new(currency: &str, discounts: Arc<DiscountCatalog>) -> Self {
        Self {
            items: vec![], total: Money::zero(currency), discount: None, discounted_total: Money::zero(currency),
            currency: currency.to_string(), discounts, events: vec![],
        }
    }

    /// Empty INR cart backed by the built-in discount codes.
    pub fn with_builtin_discounts() -> Self { Self::new("INR", Arc::new(DiscountCatalog::builtin())) }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn total(&self) -> &Money { &self.total }
    pub fn discount(&self) -> Option<&Discount> { self.discount.as_ref() }
    pub fn discounted_total(&self) -> &Money { &self.discounted_total }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn line_count(&self) -> usize { self.items.len() }
    /// Units across all lines, as shown on the header badge.
    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }
    pub fn get(&self, product_id: &str) -> Option<&CartItem> { self.items.iter().find(|i| i.product_id() == product_id) }

    pub fn savings(&self) -> Money {
        self.total.saturating_sub(&self.discounted_total).unwrap_or_else(|_| Money::zero(&self.currency))
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(), total: self.total.clone(),
            discount: self.discount.clone(), discounted_total: self.discounted_total.clone(),
        }
    }

    /// Adds `quantity` units, clamped to the product's stock. A request of
    /// zero counts as one.
    pub fn add_to_cart(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if !product.is_in_stock() {
            warn!(product_id = %product.id, "add to cart rejected: out of stock");
            return Err(CartError::OutOfStock { product_id: product.id.clone() });
        }
        if product.price.currency() != self.currency {
            return Err(CartError::CurrencyMismatch { expected: self.currency.clone(), got: product.price.currency().to_string() });
        }
        let requested = quantity.max(1);
        let (quantity, wanted) = match self.items.iter_mut().find(|i| i.product.id == product.id) {
            Some(existing) => {
                let wanted = existing.quantity.saturating_add(requested);
                existing.quantity = wanted.min(product.stock);
                (existing.quantity, wanted)
            }
            None => {
                let item = CartItem { product: product.clone(), quantity: requested.min(product.stock) };
                let quantity = item.quantity;
                self.items.push(item);
                (quantity, requested)
            }
        };
        debug!(product_id = %product.id, quantity, requested = wanted, "cart line set");
        self.recalculate();
        self.raise_event(CartEvent::ItemAdded { product_id: product.id.clone(), quantity, clamped: quantity < wanted });
        Ok(())
    }

    /// Drops the line for `product_id`. Returns whether anything was removed.
    pub fn remove_from_cart(&mut self, product_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id() != product_id);
        if self.items.len() == before { return false; }
        debug!(product_id, "cart line removed");
        self.recalculate();
        self.raise_event(CartEvent::ItemRemoved { product_id: product_id.to_string() });
        true
    }

    /// Zero removes the line; anything else is capped at the line's stock.
    /// Unknown ids are ignored.
    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) {
        if quantity == 0 {
            self.remove_from_cart(product_id);
            return;
        }
        let Some(item) = self.items.iter_mut().find(|i| i.product.id == product_id) else { return };
        item.quantity = quantity.min(item.product.stock);
        let quantity = item.quantity;
        debug!(product_id, quantity, "cart quantity updated");
        self.recalculate();
        self.raise_event(CartEvent::QuantityUpdated { product_id: product_id.to_string(), quantity });
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.discount = None;
        self.recalculate();
        self.raise_event(CartEvent::Cleared);
    }

    /// Looks `code` up case-insensitively and replaces any applied discount.
    pub fn apply_discount(&mut self, code: &str) -> Result<Discount, CartError> {
        let Some(discount) = self.discounts.lookup(code) else {
            warn!(code, "invalid discount code");
            return Err(CartError::InvalidDiscountCode(code.to_string()));
        };
        debug!(code = %discount.code, "discount applied");
        self.discount = Some(discount.clone());
        self.recalculate();
        self.raise_event(CartEvent::DiscountApplied { code: discount.code.clone() });
        Ok(discount)
    }

    pub fn remove_discount(&mut self) {
        if self.discount.take().is_some() {
            self.raise_event(CartEvent::DiscountRemoved);
        }
        self.recalculate();
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: CartEvent) { self.events.push(DomainEvent::Cart(e)); }

    fn recalculate(&mut self) {
        self.total = self.items.iter().fold(Money::zero(&self.currency), |acc, i| acc.add(&i.line_total()).unwrap_or(acc));
        self.discounted_total = match &self.discount {
            Some(d) => d.apply(&self.total),
            None => self.total.clone(),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Product {product_id} is out of stock")]
    OutOfStock { product_id: String },
    #[error("Invalid discount code \"{0}\"")]
    InvalidDiscountCode(String),
    #[error("cart is priced in {expected}, product in {got}")]
    CurrencyMismatch { expected: String, got: String },
}

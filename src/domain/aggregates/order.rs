//! Order Aggregate

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::{NoContext, Timestamp, Uuid};
use validator::{Validate, ValidationErrors};
use crate::domain::aggregates::cart::{CartItem, CartSnapshot};
use crate::domain::aggregates::discount::Discount;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{Money, MoneyError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod { Card, Upi, Cod }

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Card => "card", Self::Upi => "upi", Self::Cod => "cod" }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            "cod" => Ok(Self::Cod),
            other => Err(OrderError::UnknownPaymentMethod(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus { #[default] Confirmed, Processing, Shipped, OutForDelivery, Delivered, Cancelled }

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed", Self::Processing => "processing", Self::Shipped => "shipped",
            Self::OutForDelivery => "out_for_delivery", Self::Delivered => "delivered", Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    /// Next fulfillment step, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Confirmed => Some(Self::Processing),
            Self::Processing => Some(Self::Shipped),
            Self::Shipped => Some(Self::OutForDelivery),
            Self::OutForDelivery => Some(Self::Delivered),
            Self::Delivered | Self::Cancelled => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ContactInfo {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(length(min = 1))]
    pub phone: String,
}

impl ContactInfo {
    /// Blank form with the email prefilled from the signed-in user, if any.
    pub fn prefilled(email: Option<&str>) -> Self {
        Self { email: email.unwrap_or_default().to_string(), ..Self::default() }
    }

    pub fn full_name(&self) -> String { format!("{} {}", self.first_name, self.last_name) }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub state: String,
    #[validate(length(min = 1, max = 10))]
    pub pincode: String,
}

impl ShippingAddress {
    pub fn one_line(&self) -> String { format!("{}, {}, {} {}", self.address, self.city, self.state, self.pincode) }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CustomerInfo {
    #[validate]
    pub contact: ContactInfo,
    #[validate]
    pub address: ShippingAddress,
}

/// Fees, tax and timing applied when a cart becomes an order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutPolicy {
    pub card_surcharge: Decimal,
    pub tax_rate: Decimal,
    pub delivery_days: i64,
    pub cod_delivery_days: i64,
    pub cancel_window: Duration,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            card_surcharge: Decimal::from(30), tax_rate: Decimal::new(18, 2),
            delivery_days: 4, cod_delivery_days: 5, cancel_window: Duration::hours(24),
        }
    }
}

impl CheckoutPolicy {
    pub fn surcharge(&self, method: PaymentMethod) -> Decimal {
        if method == PaymentMethod::Card { self.card_surcharge } else { Decimal::ZERO }
    }

    pub fn delivery_days(&self, method: PaymentMethod) -> i64 {
        if method == PaymentMethod::Cod { self.cod_delivery_days } else { self.delivery_days }
    }

    /// `round((subtotal + surcharge) * (1 + tax_rate))`
    pub fn grand_total(&self, subtotal: &Money, method: PaymentMethod) -> Result<Money, MoneyError> {
        let charges = Money::new(self.surcharge(method), subtotal.currency());
        Ok(subtotal.add(&charges)?.scale(Decimal::ONE + self.tax_rate).round_units())
    }
}

/// Totals shown on the checkout page before payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckoutQuote {
    pub payment_charges: Money,
    pub total: Money,
    pub original_total: Money,
}

impl CheckoutQuote {
    pub fn savings(&self) -> Money {
        self.original_total.saturating_sub(&self.total).unwrap_or_else(|_| Money::zero(self.total.currency()))
    }
}

#[derive(Clone, Debug, Default)]
pub struct OrderBuilder { policy: CheckoutPolicy }

impl OrderBuilder {
    pub fn new(policy: CheckoutPolicy) -> Self { Self { policy } }
    pub fn policy(&self) -> &CheckoutPolicy { &self.policy }

    pub fn quote(&self, cart: &CartSnapshot, method: PaymentMethod) -> Result<CheckoutQuote, OrderError> {
        Ok(CheckoutQuote {
            payment_charges: Money::new(self.policy.surcharge(method), cart.total.currency()),
            total: self.policy.grand_total(&cart.discounted_total, method)?,
            original_total: self.policy.grand_total(&cart.total, method)?,
        })
    }

    /// Turns a cart snapshot into a confirmed order. Leaves the cart alone.
    pub fn build(
        &self, cart: &CartSnapshot, method: PaymentMethod, customer: CustomerInfo, now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        if cart.is_empty() { return Err(OrderError::EmptyCart); }
        customer.validate()?;
        let quote = self.quote(cart, method)?;
        let mut order = Order {
            id: order_id_at(now),
            items: cart.items.clone(),
            total: quote.total,
            original_total: quote.original_total,
            discount: cart.discount.clone(),
            payment_method: method,
            payment_charges: quote.payment_charges,
            customer_info: customer,
            status: OrderStatus::Confirmed,
            date: now,
            estimated_delivery: now + Duration::days(self.policy.delivery_days(method)),
            can_cancel: true,
            cancel_deadline: now + self.policy.cancel_window,
            events: vec![],
        };
        info!(order_id = %order.id, total = %order.total, method = %method, "order built");
        order.raise_event(OrderEvent::Placed { order_id: order.id.clone(), total: order.total.clone() });
        Ok(order)
    }
}

/// Time-ordered v7 id seeded from the creation instant.
fn order_id_at(now: DateTime<Utc>) -> String {
    let secs = u64::try_from(now.timestamp()).unwrap_or_default();
    Uuid::new_v7(Timestamp::from_unix(NoContext, secs, now.timestamp_subsec_nanos())).to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: String,
    items: Vec<CartItem>,
    total: Money,
    original_total: Money,
    discount: Option<Discount>,
    payment_method: PaymentMethod,
    payment_charges: Money,
    customer_info: CustomerInfo,
    status: OrderStatus,
    date: DateTime<Utc>,
    estimated_delivery: DateTime<Utc>,
    can_cancel: bool,
    cancel_deadline: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Order {
    pub fn id(&self) -> &str { &self.id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn total(&self) -> &Money { &self.total }
    pub fn original_total(&self) -> &Money { &self.original_total }
    pub fn discount(&self) -> Option<&Discount> { self.discount.as_ref() }
    pub fn payment_method(&self) -> PaymentMethod { self.payment_method }
    pub fn payment_charges(&self) -> &Money { &self.payment_charges }
    pub fn customer_info(&self) -> &CustomerInfo { &self.customer_info }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn date(&self) -> DateTime<Utc> { self.date }
    pub fn estimated_delivery(&self) -> DateTime<Utc> { self.estimated_delivery }
    pub fn can_cancel(&self) -> bool { self.can_cancel }
    pub fn cancel_deadline(&self) -> DateTime<Utc> { self.cancel_deadline }
    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }

    pub fn is_cancellable_at(&self, now: DateTime<Utc>) -> bool {
        self.can_cancel && now < self.cancel_deadline && !self.status.is_terminal()
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        if !self.can_cancel || self.status.is_terminal() {
            warn!(order_id = %self.id, status = %self.status, "cancel rejected");
            return Err(OrderError::NotCancellable { order_id: self.id.clone(), status: self.status });
        }
        if now >= self.cancel_deadline {
            warn!(order_id = %self.id, deadline = %self.cancel_deadline, "cancel window expired");
            return Err(OrderError::CancelWindowExpired { order_id: self.id.clone(), deadline: self.cancel_deadline });
        }
        self.status = OrderStatus::Cancelled;
        self.can_cancel = false;
        info!(order_id = %self.id, "order cancelled");
        self.raise_event(OrderEvent::Cancelled { order_id: self.id.clone() });
        Ok(())
    }

    /// Moves one step along confirmed → processing → shipped → out for delivery → delivered.
    pub fn advance_fulfillment(&mut self) -> Result<OrderStatus, OrderError> {
        let next = self.status.next().ok_or(OrderError::InvalidTransition { order_id: self.id.clone(), from: self.status })?;
        self.status = next;
        if next.is_terminal() { self.can_cancel = false; }
        info!(order_id = %self.id, status = %next, "order advanced");
        self.raise_event(OrderEvent::Advanced { order_id: self.id.clone(), status: next.as_str() });
        Ok(next)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: OrderEvent) { self.events.push(DomainEvent::Order(e)); }
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("cannot check out an empty cart")]
    EmptyCart,
    #[error("invalid customer details: {0}")]
    InvalidCustomer(#[from] ValidationErrors),
    #[error("order {order_id} can no longer be cancelled (deadline {deadline})")]
    CancelWindowExpired { order_id: String, deadline: DateTime<Utc> },
    #[error("order {order_id} is {status} and cannot be cancelled")]
    NotCancellable { order_id: String, status: OrderStatus },
    #[error("order {order_id} cannot advance past {from}")]
    InvalidTransition { order_id: String, from: OrderStatus },
    #[error("unknown payment method {0:?}")]
    UnknownPaymentMethod(String),
    #[error(transparent)]
    Money(#[from] MoneyError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use chrono::TimeZone;
    use crate::domain::aggregates::cart::Cart;
    use crate::domain::aggregates::discount::DiscountCatalog;
    use crate::domain::aggregates::product::Product;

    fn inr(n: i64) -> Money { Money::units(n, "INR") }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            contact: ContactInfo {
                email: "johndoe@quicksell.com".into(), first_name: "John".into(), last_name: "Doe".into(), phone: "9876543210".into(),
            },
            address: ShippingAddress { address: "12 MG Road".into(), city: "Bengaluru".into(), state: "KA".into(), pincode: "560001".into() },
        }
    }

    fn cart_worth(total: i64, code: Option<&str>) -> Cart {
        let mut cart = Cart::new("INR", Arc::new(DiscountCatalog::builtin()));
        cart.add_to_cart(&Product::new("P1", "Widget", inr(total), 10), 1).unwrap();
        if let Some(code) = code { cart.apply_discount(code).unwrap(); }
        cart
    }

    fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap() }

    #[test]
    fn test_cod_order() {
        let cart = cart_worth(1000, Some("SAVE10"));
        let order = OrderBuilder::default().build(&cart.snapshot(), PaymentMethod::Cod, customer(), now()).unwrap();
        assert_eq!(order.payment_charges(), &inr(0));
        assert_eq!(order.total(), &inr(1062));
        assert_eq!(order.original_total(), &inr(1180));
        assert_eq!(order.estimated_delivery(), now() + Duration::days(5));
        assert_eq!(order.status(), OrderStatus::Confirmed);
        assert!(order.can_cancel());
        assert_eq!(order.cancel_deadline(), now() + Duration::hours(24));
    }

    #[test]
    fn test_card_surcharge_taxed() {
        let cart = cart_worth(1000, Some("SAVE10"));
        let order = OrderBuilder::default().build(&cart.snapshot(), PaymentMethod::Card, customer(), now()).unwrap();
        assert_eq!(order.payment_charges(), &inr(30));
        assert_eq!(order.total(), &inr(1097));
        assert_eq!(order.estimated_delivery(), now() + Duration::days(4));
    }

    #[test]
    fn test_upi_has_no_surcharge() {
        let cart = cart_worth(2999, Some("WELCOME15"));
        let order = OrderBuilder::default().build(&cart.snapshot(), PaymentMethod::Upi, customer(), now()).unwrap();
        // 2549.15 * 1.18 = 3007.997
        assert_eq!(order.total(), &inr(3008));
        assert_eq!(order.payment_charges(), &inr(0));
    }

    #[test]
    fn test_empty_cart_refused() {
        let cart = Cart::with_builtin_discounts();
        let err = OrderBuilder::default().build(&cart.snapshot(), PaymentMethod::Card, customer(), now()).unwrap_err();
        assert!(matches!(err, OrderError::EmptyCart));
    }

    #[test]
    fn test_invalid_customer_refused() {
        let mut info = customer();
        info.contact.email = "not-an-email".into();
        info.address.city.clear();
        let err = OrderBuilder::default().build(&cart_worth(100, None).snapshot(), PaymentMethod::Upi, info, now()).unwrap_err();
        assert!(matches!(err, OrderError::InvalidCustomer(_)));
    }

    #[test]
    fn test_items_are_frozen() {
        let mut cart = cart_worth(100, None);
        let order = OrderBuilder::default().build(&cart.snapshot(), PaymentMethod::Upi, customer(), now()).unwrap();
        cart.update_quantity("P1", 7);
        cart.clear();
        assert_eq!(order.items().len(), 1);
        assert_eq!(order.items()[0].quantity, 1);
    }

    #[test]
    fn test_ids_unique_within_same_instant() {
        let cart = cart_worth(100, None).snapshot();
        let builder = OrderBuilder::default();
        let a = builder.build(&cart, PaymentMethod::Upi, customer(), now()).unwrap();
        let b = builder.build(&cart, PaymentMethod::Upi, customer(), now()).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_cancel_once_within_window() {
        let mut order = OrderBuilder::default().build(&cart_worth(100, None).snapshot(), PaymentMethod::Upi, customer(), now()).unwrap();
        order.cancel(now() + Duration::hours(23)).unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert!(!order.can_cancel());
        let err = order.cancel(now() + Duration::hours(23)).unwrap_err();
        assert!(matches!(err, OrderError::NotCancellable { .. }));
    }

    #[test]
    fn test_cancel_after_deadline_rejected() {
        let mut order = OrderBuilder::default().build(&cart_worth(100, None).snapshot(), PaymentMethod::Upi, customer(), now()).unwrap();
        let err = order.cancel(now() + Duration::hours(24)).unwrap_err();
        assert!(matches!(err, OrderError::CancelWindowExpired { .. }));
        assert_eq!(order.status(), OrderStatus::Confirmed);
        assert!(order.can_cancel());
    }

    #[test]
    fn test_fulfillment_runs_to_delivered() {
        let mut order = OrderBuilder::default().build(&cart_worth(100, None).snapshot(), PaymentMethod::Upi, customer(), now()).unwrap();
        for expected in [OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::OutForDelivery, OrderStatus::Delivered] {
            assert_eq!(order.advance_fulfillment().unwrap(), expected);
        }
        assert!(order.advance_fulfillment().is_err());
        assert!(!order.is_cancellable_at(now()));
        assert!(matches!(order.cancel(now()), Err(OrderError::NotCancellable { .. })));
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("CARD".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!(" cod ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cod);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }
}

//! Domain events
//!
//! Advisory notifications the UI layer can drain after each operation. Nothing
//! in the engine depends on them being observed.
use crate::domain::value_objects::{DiscountCode, Money};
use crate::payment::PaymentStage;

#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    Cart(CartEvent),
    Order(OrderEvent),
    Payment(PaymentEvent),
}

#[derive(Clone, Debug, PartialEq)]
pub enum CartEvent {
    ItemAdded { product_id: String, quantity: u32, clamped: bool },
    ItemRemoved { product_id: String },
    QuantityUpdated { product_id: String, quantity: u32 },
    Cleared,
    DiscountApplied { code: DiscountCode },
    DiscountRemoved,
}

#[derive(Clone, Debug, PartialEq)]
pub enum OrderEvent {
    Placed { order_id: String, total: Money },
    Advanced { order_id: String, status: &'static str },
    Cancelled { order_id: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum PaymentEvent {
    StageEntered { stage: PaymentStage, progress: u8 },
}

impl DomainEvent {
    /// Toast-style text for the event. Wording is not load-bearing.
    pub fn message(&self) -> String {
        match self {
            Self::Cart(CartEvent::ItemAdded { clamped: true, quantity, .. }) => format!("Added to cart! Only {quantity} available"),
            Self::Cart(CartEvent::ItemAdded { .. }) => "Added to cart!".to_string(),
            Self::Cart(CartEvent::ItemRemoved { .. }) => "Removed from cart".to_string(),
            Self::Cart(CartEvent::QuantityUpdated { quantity, .. }) => format!("Quantity set to {quantity}"),
            Self::Cart(CartEvent::Cleared) => "Cart cleared".to_string(),
            Self::Cart(CartEvent::DiscountApplied { code }) => format!("Discount code \"{code}\" applied!"),
            Self::Cart(CartEvent::DiscountRemoved) => "Discount removed".to_string(),
            Self::Order(OrderEvent::Placed { .. }) => "Order placed successfully!".to_string(),
            Self::Order(OrderEvent::Advanced { order_id, status }) => format!("Order #{order_id} is now {status}"),
            Self::Order(OrderEvent::Cancelled { order_id }) => format!("Order #{order_id} cancelled"),
            Self::Payment(PaymentEvent::StageEntered { stage, .. }) => stage.message().to_string(),
        }
    }
}

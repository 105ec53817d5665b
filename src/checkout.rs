//! Checkout pipeline: cart → simulated payment → order → order store

use tracing::{info, instrument};
use validator::Validate;
use crate::clock::Clock;
use crate::domain::aggregates::{Cart, CheckoutQuote, CustomerInfo, Order, OrderBuilder, OrderError, PaymentMethod};
use crate::domain::events::DomainEvent;
use crate::payment::{PaymentReceipt, PaymentSimulator, PaymentTiming, Scheduler};
use crate::repository::{OrderChange, OrderRepository, OrderStore};
use crate::Result;

#[derive(Clone, Debug)]
pub struct CheckoutOutcome {
    pub order: Order,
    pub receipt: PaymentReceipt,
    /// Payment progress and order notifications, in the order they happened.
    pub events: Vec<DomainEvent>,
}

#[derive(Debug)]
pub struct CheckoutService<R: OrderRepository, C: Clock, S: Scheduler> {
    builder: OrderBuilder,
    orders: OrderStore<R>,
    clock: C,
    scheduler: S,
    timing: PaymentTiming,
}

impl<R: OrderRepository, C: Clock, S: Scheduler> CheckoutService<R, C, S> {
    pub fn new(builder: OrderBuilder, orders: OrderStore<R>, clock: C, scheduler: S, timing: PaymentTiming) -> Self {
        Self { builder, orders, clock, scheduler, timing }
    }

    pub fn orders(&self) -> &OrderStore<R> { &self.orders }
    pub fn clock(&self) -> &C { &self.clock }

    pub fn quote(&self, cart: &Cart, method: PaymentMethod) -> Result<CheckoutQuote> {
        Ok(self.builder.quote(&cart.snapshot(), method)?)
    }

    /// Simulates payment, records the order and empties the cart.
    ///
    /// The cart is left untouched if anything fails before the order is stored.
    #[instrument(skip_all, fields(method = %method))]
    pub async fn place_order(&mut self, cart: &mut Cart, method: PaymentMethod, customer: CustomerInfo) -> Result<CheckoutOutcome> {
        if cart.is_empty() { return Err(OrderError::EmptyCart.into()); }
        customer.validate().map_err(OrderError::from)?;
        let snapshot = cart.snapshot();

        let mut payment = PaymentSimulator::new(&self.scheduler, self.timing);
        payment.run().await;
        let mut events = payment.take_events();

        let now = self.clock.now();
        let mut order = self.builder.build(&snapshot, method, customer, now)?;
        events.extend(order.take_events());
        let receipt = PaymentReceipt::issue(method, order.total().clone(), now);
        let stored = self.orders.append(order)?;
        events.extend(stored.events);
        let order = stored.order.clone();

        cart.clear();
        cart.take_events();
        info!(order_id = %order.id(), transaction_id = %receipt.transaction_id, "checkout complete");
        Ok(CheckoutOutcome { order, receipt, events })
    }

    /// Cancels `id` against the service clock; the change carries the
    /// cancellation notice.
    pub fn cancel_order(&mut self, id: &str) -> Result<OrderChange<'_>> {
        let now = self.clock.now();
        Ok(self.orders.cancel(id, now)?)
    }

    pub fn advance_order(&mut self, id: &str) -> Result<OrderChange<'_>> { Ok(self.orders.advance(id)?) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use chrono::{Duration, TimeZone, Utc};
    use crate::clock::ManualClock;
    use crate::domain::aggregates::{ContactInfo, DiscountCatalog, OrderStatus, Product, ShippingAddress};
    use crate::domain::events::OrderEvent;
    use crate::domain::value_objects::Money;
    use crate::payment::ImmediateScheduler;
    use crate::repository::{InMemoryOrderRepository, StoreError};
    use crate::StorefrontError;

    type Service = CheckoutService<InMemoryOrderRepository, ManualClock, ImmediateScheduler>;

    fn service() -> Service {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        let orders = OrderStore::open(InMemoryOrderRepository::new()).unwrap();
        CheckoutService::new(OrderBuilder::default(), orders, clock, ImmediateScheduler::new(), PaymentTiming::default())
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            contact: ContactInfo { email: "johndoe@quicksell.com".into(), first_name: "John".into(), last_name: "Doe".into(), phone: "98".into() },
            address: ShippingAddress { address: "12 MG Road".into(), city: "Bengaluru".into(), state: "KA".into(), pincode: "560001".into() },
        }
    }

    fn cart() -> Cart {
        let mut cart = Cart::new("INR", Arc::new(DiscountCatalog::builtin()));
        cart.add_to_cart(&Product::new("1", "Speaker", Money::units(500, "INR"), 5), 2).unwrap();
        cart.apply_discount("SAVE10").unwrap();
        cart
    }

    #[tokio::test]
    async fn test_place_order_clears_cart() {
        let mut svc = service();
        let mut cart = cart();
        let quote = svc.quote(&cart, PaymentMethod::Cod).unwrap();
        let outcome = svc.place_order(&mut cart, PaymentMethod::Cod, customer()).await.unwrap();

        assert!(cart.is_empty());
        assert!(cart.discount().is_none());
        assert_eq!(outcome.order.total(), &Money::units(1062, "INR"));
        assert_eq!(outcome.order.total(), &quote.total);
        assert_eq!(outcome.receipt.amount, quote.total);
        assert_eq!(svc.orders().len(), 1);
        assert!(matches!(outcome.events.last(), Some(DomainEvent::Order(OrderEvent::Placed { .. }))));
        assert_eq!(svc.scheduler.requested().len(), 5);
    }

    #[tokio::test]
    async fn test_empty_cart_never_reaches_payment() {
        let mut svc = service();
        let mut cart = Cart::with_builtin_discounts();
        let err = svc.place_order(&mut cart, PaymentMethod::Card, customer()).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Order(OrderError::EmptyCart)));
        assert!(svc.scheduler.requested().is_empty());
        assert!(svc.orders().is_empty());
    }

    #[tokio::test]
    async fn test_bad_form_keeps_cart() {
        let mut svc = service();
        let mut cart = cart();
        let mut info = customer();
        info.contact.phone.clear();
        let err = svc.place_order(&mut cart, PaymentMethod::Upi, info).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Order(OrderError::InvalidCustomer(_))));
        assert_eq!(cart.line_count(), 1);
        assert!(svc.scheduler.requested().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_uses_clock() {
        let mut svc = service();
        let id = svc.place_order(&mut cart(), PaymentMethod::Upi, customer()).await.unwrap().order.id().to_string();
        svc.clock().advance(Duration::hours(24));
        let err = svc.cancel_order(&id).unwrap_err();
        assert!(matches!(err, StorefrontError::Store(StoreError::Order(OrderError::CancelWindowExpired { .. }))));

        let id = svc.place_order(&mut cart(), PaymentMethod::Upi, customer()).await.unwrap().order.id().to_string();
        svc.clock().advance(Duration::hours(23));
        let cancelled = svc.cancel_order(&id).unwrap();
        assert_eq!(cancelled.order.status(), OrderStatus::Cancelled);
        assert!(matches!(cancelled.events.as_slice(), [DomainEvent::Order(OrderEvent::Cancelled { .. })]));
    }

    #[tokio::test]
    async fn test_advance_reports_status() {
        let mut svc = service();
        let id = svc.place_order(&mut cart(), PaymentMethod::Card, customer()).await.unwrap().order.id().to_string();
        let change = svc.advance_order(&id).unwrap();
        assert_eq!(change.order.status(), OrderStatus::Processing);
        assert_eq!(change.events[0].message(), format!("Order #{id} is now processing"));
    }
}

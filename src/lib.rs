//! QuickSell storefront engine
//!
//! Cart pricing, discount codes and the checkout-to-order pipeline behind the
//! QuickSell demo shop. Payments are simulated and orders are kept in a local
//! JSON log; there is no server.
//!
//! ## Features
//! - Cart with stock clamping and case-insensitive discount codes
//! - Order building with card surcharge, 18% tax and delivery estimates
//! - Append-only order store with a 24 hour cancellation window
//! - Staged payment simulation driven by a pluggable scheduler
//! - Wholesale tier quotes

pub mod checkout;
pub mod clock;
pub mod config;
pub mod domain;
pub mod payment;
pub mod repository;

use thiserror::Error;

pub use checkout::{CheckoutOutcome, CheckoutService};
pub use config::{ConfigError, StoreConfig};

pub mod prelude {
    pub use crate::checkout::{CheckoutOutcome, CheckoutService};
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::domain::aggregates::*;
    pub use crate::domain::events::{CartEvent, DomainEvent, OrderEvent, PaymentEvent};
    pub use crate::domain::value_objects::{DiscountCode, Money};
    pub use crate::payment::{ImmediateScheduler, PaymentReceipt, PaymentSimulator, PaymentStage, PaymentTiming, Scheduler, TokioScheduler};
    pub use crate::repository::{
        InMemoryOrderRepository, InMemorySessionStore, JsonFileOrderRepository, JsonFileSessionStore, OrderChange,
        OrderRepository, OrderStore, SessionStore,
    };
    pub use crate::{StorefrontError, StoreConfig};
}

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error(transparent)]
    Cart(#[from] domain::aggregates::CartError),

    #[error(transparent)]
    Order(#[from] domain::aggregates::OrderError),

    #[error(transparent)]
    Store(#[from] repository::StoreError),

    #[error(transparent)]
    Catalog(#[from] domain::aggregates::CatalogError),

    #[error(transparent)]
    Discount(#[from] domain::aggregates::DiscountError),

    #[error(transparent)]
    Wholesale(#[from] domain::aggregates::WholesaleError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

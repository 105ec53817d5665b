//! Aggregates module
pub mod product;
pub mod discount;
pub mod cart;
pub mod order;
pub mod user;
pub mod wholesale;

pub use product::{Catalog, CatalogError, Product};
pub use discount::{Discount, DiscountCatalog, DiscountError, DiscountRule};
pub use cart::{Cart, CartError, CartItem, CartSnapshot};
pub use order::{
    CheckoutPolicy, CheckoutQuote, ContactInfo, CustomerInfo, Order, OrderBuilder, OrderError, OrderStatus,
    PaymentMethod, ShippingAddress,
};
pub use user::{Role, User};
pub use wholesale::{WholesaleError, WholesaleQuote};

//! QuickSell - scripted storefront checkout

use std::sync::Arc;
use anyhow::{Context, Result};
use quicksell::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = StoreConfig::from_env()?;
    let catalog = config.load_catalog().with_context(|| format!("loading {}", config.catalog_path.display()))?;
    let discounts = Arc::new(config.load_discounts()?);
    tracing::info!(products = catalog.len(), codes = discounts.len(), data_dir = %config.data_dir.display(), "QuickSell storefront ready");

    let session = JsonFileSessionStore::new(config.session_path());
    let user = session.current_user()?;

    let mut cart = Cart::new(&config.currency, discounts);
    for product in catalog.products() {
        if let Err(e) = cart.add_to_cart(product, 2) {
            tracing::warn!(product_id = %product.id, "{e}");
        }
        if cart.line_count() == 2 { break; }
    }
    if let Err(e) = cart.apply_discount("save10") {
        tracing::warn!("{e}");
    }
    for event in cart.take_events() {
        tracing::info!("{}", event.message());
    }

    let orders = OrderStore::open(JsonFileOrderRepository::new(config.orders_path()))?;
    let mut checkout = CheckoutService::new(OrderBuilder::new(config.policy.clone()), orders, SystemClock, TokioScheduler, config.payment);

    let method = config.payment_method;
    let quote = checkout.quote(&cart, method)?;
    tracing::info!(items = cart.item_count(), total = %quote.total, savings = %quote.savings(), "checking out");

    let customer = CustomerInfo {
        contact: ContactInfo {
            first_name: "John".into(), last_name: "Doe".into(), phone: "9876543210".into(),
            ..ContactInfo::prefilled(Some(user.as_ref().map_or("johndoe@quicksell.com", |u| u.email.as_str())))
        },
        address: ShippingAddress { address: "12 MG Road".into(), city: "Bengaluru".into(), state: "Karnataka".into(), pincode: "560001".into() },
    };
    let outcome = checkout.place_order(&mut cart, method, customer).await?;
    for event in &outcome.events {
        tracing::info!("{}", event.message());
    }
    tracing::info!(
        order_id = %outcome.order.id(), transaction_id = %outcome.receipt.transaction_id,
        total = %outcome.order.total(), delivery = %outcome.order.estimated_delivery().date_naive(),
        cancel_by = %outcome.order.cancel_deadline(), orders = checkout.orders().len(),
        customer = %outcome.order.customer_info().contact.full_name(),
        ship_to = %outcome.order.customer_info().address.one_line(),
        "order confirmed"
    );
    Ok(())
}

//! formcart - headless storefront session
//!
//! Loads the catalog from the configured forms, restores the persisted
//! shopping state and reports what a storefront would show.

use anyhow::{Context, Result};
use formcart::catalog::query;
use formcart::{Storefront, StorefrontConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = StorefrontConfig::from_env().context("loading configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let mut session = Storefront::open(config).context("opening storefront session")?;
    session.refresh_catalog().await;
    if let Some(warning) = session.catalog.warning() {
        tracing::warn!("{warning}");
    }

    let (catalog, shop) = (&session.catalog, &session.shop);
    tracing::info!(
        products = catalog.products().len(),
        categories = ?query::categories(catalog.all_products()),
        "catalog ready"
    );
    tracing::info!(
        cart_lines = shop.cart().line_count(),
        items = shop.item_count(),
        subtotal = %shop.subtotal(),
        favorites = shop.favorites().len(),
        orders = shop.order_history().len(),
        checkout_ready = session.checkout.draft().has_required_fields(),
        "🛒 formcart session restored from {}",
        session.config.state_path.display()
    );
    Ok(())
}

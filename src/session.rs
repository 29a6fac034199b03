//! Wiring of one storefront session over a state file.

use std::sync::Arc;

use tracing::info;

use crate::catalog::{CatalogView, FormApiClient};
use crate::checkout::{CheckoutFlow, FormOrderGateway};
use crate::config::StorefrontConfig;
use crate::shop::ShopState;
use crate::store::{FileStore, PersistentStore};
use crate::Result;

pub struct Storefront {
    pub config: StorefrontConfig,
    pub catalog: CatalogView,
    pub shop: ShopState,
    pub checkout: CheckoutFlow<FormOrderGateway>,
    client: FormApiClient,
}

impl Storefront {
    /// Validates the configuration and restores state from `config.state_path`.
    pub fn open(config: StorefrontConfig) -> Result<Self> {
        config.validate()?;
        let store = FileStore::open(&config.state_path)?;
        Self::with_store(config, Arc::new(store))
    }

    /// Same as [`Storefront::open`] over an arbitrary store.
    pub fn with_store(config: StorefrontConfig, store: Arc<dyn PersistentStore>) -> Result<Self> {
        let client = FormApiClient::new(&config)?;
        let gateway = FormOrderGateway::new(&config, client.clone())?;
        let shop = ShopState::load(Arc::clone(&store));
        let checkout = CheckoutFlow::load(gateway, store, config.confirmation_reset);
        info!(sources = config.sources.len(), "storefront session opened");
        Ok(Self { config, catalog: CatalogView::new(), shop, checkout, client })
    }

    /// Reloads the catalog from every configured source.
    pub async fn refresh_catalog(&mut self) -> bool {
        self.catalog.refresh(&self.client, &self.config.sources, self.config.synthetic_fallback).await
    }
}

//! formcart storefront core
//!
//! Client-side storefront logic for a shop whose catalog lives in a
//! third-party form-builder API and whose orders are posted back to it.
//!
//! ## Features
//! - Catalog acquisition from several forms with tiered fallbacks
//! - Normalization of loosely shaped remote product records
//! - Cart, favorites and recently-viewed state with durable persistence
//! - Four-step checkout flow with guarded navigation
//! - Order submission with tri-state outcomes

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod session;
pub mod shop;
pub mod store;

pub use catalog::{fetch_catalog, CatalogOutcome, CatalogView, FormApi, FormApiClient};
pub use checkout::{CheckoutError, CheckoutFlow, CheckoutStep, FormOrderGateway, OrderGateway, SubmissionOutcome};
pub use config::{ConfigError, Environment, StorefrontConfig};
pub use domain::aggregates::{Cart, CartItem, CheckoutDraft, Favorites, Order, Product, ViewedLog};
pub use domain::value_objects::{Money, PaymentMethod, ProductId, SourceId};
pub use session::Storefront;
pub use shop::ShopState;
pub use store::{FileStore, MemoryStore, PersistentStore, StoreError};

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

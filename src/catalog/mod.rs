//! Catalog acquisition.
//!
//! # Pipeline
//!
//! Each source (a form id) is tried tier by tier, stopping at the first tier
//! that yields at least one product:
//!
//! 1. `payment-info` endpoint
//! 2. `questions` endpoint (product/payment field descriptors)
//! 3. `submissions` endpoint (products embedded in past answers)
//! 4. synthetic catalog derived from a hash of the form id
//!
//! Per-source lists are merged with source-prefixed ids. When the merged list
//! has nothing a storefront would show (no products, or only products with
//! placeholder images, as the synthetic tier produces), the built-in seed
//! catalog is served with a soft warning. [`fetch_catalog`] never fails and
//! never returns a list without displayable products.

mod client;
mod extract;
pub mod normalize;
pub mod query;
pub mod seed;
pub mod synthetic;
mod view;

pub use client::{Endpoint, FormApi, FormApiClient};
pub use view::{CatalogView, LoadTicket};

use std::collections::HashSet;
use std::fmt;
use std::future::Future;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::aggregates::Product;
use crate::domain::value_objects::{ProductId, SourceId};

/// Banner text shown when the seed catalog stands in for every source.
pub const FALLBACK_WARNING: &str = "Failed to fetch products. Using backup data.";

/// Errors raised inside one tier. They never leave the pipeline.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: Endpoint, status: u16 },

    #[error("unexpected response shape: {0}")]
    Malformed(String),

    #[error("{0} yielded no products")]
    NoProducts(Endpoint),
}

/// Where a source's products ended up coming from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    Remote(Endpoint),
    Synthetic,
    /// Every tier failed and synthesis was disabled
    Unavailable,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(endpoint) => write!(f, "{endpoint}"),
            Self::Synthetic => f.write_str("synthetic"),
            Self::Unavailable => f.write_str("unavailable"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceReport {
    pub source: SourceId,
    pub tier: Tier,
    pub count: usize,
}

#[derive(Clone, Debug)]
pub struct CatalogOutcome {
    pub products: Vec<Product>,
    pub sources: Vec<SourceReport>,
    /// Set when the seed catalog was served
    pub warning: Option<String>,
}

impl CatalogOutcome {
    pub fn used_backup(&self) -> bool { self.warning.is_some() }
}

/// Runs fallible attempts in order and returns the first success, or every
/// error when all of them fail. Attempts are produced lazily, so later ones
/// never start once an earlier one succeeds.
pub async fn first_success<T, E, I, F>(attempts: I) -> Result<T, Vec<E>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let mut errors = Vec::new();
    for attempt in attempts {
        match attempt.await {
            Ok(value) => return Ok(value),
            Err(e) => errors.push(e),
        }
    }
    Err(errors)
}

/// Fetches and merges every source. Never fails; see the module docs.
pub async fn fetch_catalog<A>(api: &A, sources: &[SourceId], synthetic_fallback: bool) -> CatalogOutcome
where
    A: FormApi + ?Sized,
{
    let mut per_source = Vec::with_capacity(sources.len());
    let mut reports = Vec::with_capacity(sources.len());

    for source in sources {
        let (tier, products) = fetch_source(api, source, synthetic_fallback).await;
        reports.push(SourceReport { source: source.clone(), tier, count: products.len() });
        per_source.push(products);
    }

    let products = merge_catalogs(per_source);
    if query::displayable(&products).is_empty() {
        warn!(sources = sources.len(), fetched = products.len(), "no source produced displayable products, serving seed catalog");
        return CatalogOutcome { products: seed::seed_catalog(), sources: reports, warning: Some(FALLBACK_WARNING.to_string()) };
    }

    info!(products = products.len(), sources = sources.len(), "catalog loaded");
    CatalogOutcome { products, sources: reports, warning: None }
}

async fn fetch_source<A>(api: &A, source: &SourceId, synthetic_fallback: bool) -> (Tier, Vec<Product>)
where
    A: FormApi + ?Sized,
{
    let attempts = Endpoint::ALL.iter().map(|&endpoint| async move {
        let result = async {
            let payload = api.fetch(source, endpoint).await?;
            let products = extract::products(endpoint, &payload)?;
            if products.is_empty() {
                return Err(CatalogError::NoProducts(endpoint));
            }
            Ok((endpoint, products))
        }
        .await;
        if let Err(e) = &result {
            debug!(source = %source, endpoint = %endpoint, error = %e, "catalog tier failed");
        }
        result
    });

    match first_success(attempts).await {
        Ok((endpoint, products)) => {
            debug!(source = %source, endpoint = %endpoint, count = products.len(), "catalog tier succeeded");
            (Tier::Remote(endpoint), products)
        }
        Err(errors) if synthetic_fallback => {
            warn!(source = %source, failures = errors.len(), "all remote tiers failed, using synthetic catalog");
            (Tier::Synthetic, synthetic::synthetic_catalog(source))
        }
        Err(errors) => {
            warn!(source = %source, failures = errors.len(), "all remote tiers failed");
            (Tier::Unavailable, Vec::new())
        }
    }
}

/// Id prefix for the source at `index`; the first source stays unprefixed.
pub fn source_prefix(index: usize) -> String {
    if index == 0 { String::new() } else { format!("form{}-", index + 1) }
}

/// Concatenates per-source lists, namespacing ids so the result has no
/// duplicates. Residual clashes get a numeric suffix.
pub fn merge_catalogs(per_source: Vec<Vec<Product>>) -> Vec<Product> {
    let mut seen: HashSet<ProductId> = HashSet::new();
    let mut merged = Vec::new();

    for (index, products) in per_source.into_iter().enumerate() {
        let prefix = source_prefix(index);
        for product in products {
            let base = product.id.prefixed(&prefix);
            let mut id = base.clone();
            let mut n = 2;
            while seen.contains(&id) {
                id = ProductId::new(format!("{base}-{n}"));
                n += 1;
            }
            seen.insert(id.clone());
            merged.push(product.with_id(id));
        }
    }
    merged
}

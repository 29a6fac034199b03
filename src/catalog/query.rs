//! Read-only catalog views. Every list here is already restricted to
//! products with at least one real image.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{Product, ViewedLog};

/// Pseudo-category matching everything.
pub const ALL_CATEGORIES: &str = "All";

/// Sort orders offered on product lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Catalog order.
    #[default]
    Featured,
    PriceLowHigh,
    PriceHighLow,
    Name,
}

pub fn displayable(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.has_real_image()).collect()
}

/// Distinct categories of displayable products, sorted.
pub fn categories(products: &[Product]) -> Vec<String> {
    let set: BTreeSet<&str> = displayable(products).into_iter().map(|p| p.category.as_str()).collect();
    set.into_iter().map(str::to_string).collect()
}

pub fn filter_by_category<'a>(products: &'a [Product], category: &str) -> Vec<&'a Product> {
    displayable(products)
        .into_iter()
        .filter(|p| category == ALL_CATEGORIES || p.category == category)
        .collect()
}

/// Case-insensitive match on name or description. A blank term matches all.
pub fn search<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    let term = term.trim().to_lowercase();
    displayable(products)
        .into_iter()
        .filter(|p| term.is_empty() || p.name.to_lowercase().contains(&term) || p.description.to_lowercase().contains(&term))
        .collect()
}

/// Stable sort, so ties keep catalog order.
pub fn sort_products(products: &mut [&Product], order: SortOrder) {
    match order {
        SortOrder::Featured => {}
        SortOrder::PriceLowHigh => products.sort_by_key(|p| p.price),
        SortOrder::PriceHighLow => products.sort_by_key(|p| Reverse(p.price)),
        SortOrder::Name => products.sort_by_cached_key(|p| p.name.to_lowercase()),
    }
}

/// Other products in the same category, in catalog order.
pub fn similar_products<'a>(products: &'a [Product], id: &str, limit: usize) -> Vec<&'a Product> {
    let Some(current) = products.iter().find(|p| p.id.as_str() == id) else {
        return Vec::new();
    };
    displayable(products)
        .into_iter()
        .filter(|p| p.id != current.id && p.category == current.category)
        .take(limit)
        .collect()
}

/// Products from the viewed log, most recent first. Ids no longer in the
/// catalog are skipped.
pub fn recently_viewed<'a>(products: &'a [Product], log: &ViewedLog, exclude: Option<&str>, limit: usize) -> Vec<&'a Product> {
    log.ids()
        .filter(|id| Some(id.as_str()) != exclude)
        .filter_map(|id| products.iter().find(|p| p.id == *id))
        .filter(|p| p.has_real_image())
        .take(limit)
        .collect()
}

//! Product Aggregate

use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{Money, ProductId};

/// Substrings that mark an image URL as a stand-in rather than a real photo.
const PLACEHOLDER_MARKERS: &[&str] = &["placehold.co", "placeholder", "?text=", "no-image"];

pub const DEFAULT_CATEGORY: &str = "General";

/// Canonical product record; every source shape is normalized into this.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: String,
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub stock: u32,
    pub max_quantity: u32,
}

impl Product {
    /// Images that are not placeholders. The primary `image` is included
    /// when it is not already listed.
    pub fn real_images(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.images.iter().map(String::as_str).filter(|u| !is_placeholder_image(u)).collect();
        if !is_placeholder_image(&self.image) && !out.contains(&self.image.as_str()) {
            out.push(&self.image);
        }
        out
    }

    /// Products without a real image are hidden from every list and grid.
    pub fn has_real_image(&self) -> bool { !self.real_images().is_empty() }

    /// Same product under a different id; used when namespacing sources.
    pub fn with_id(mut self, id: ProductId) -> Self {
        self.id = id;
        self
    }
}

pub fn is_placeholder_image(url: &str) -> bool {
    url.trim().is_empty() || PLACEHOLDER_MARKERS.iter().any(|m| url.contains(m))
}

/// Category implied by a name such as `"Banana, Regular"`: the part before
/// the first comma, or `General` when there is no comma.
pub fn category_from_name(name: &str) -> String {
    match name.split_once(',') {
        Some((prefix, _)) if !prefix.trim().is_empty() => prefix.trim().to_string(),
        _ => DEFAULT_CATEGORY.to_string(),
    }
}

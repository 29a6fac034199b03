//! Cart Aggregate

use serde::{Deserialize, Serialize};
use crate::domain::aggregates::product::Product;
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::{Money, ProductId};

/// Cart line: the product snapshot plus how many of it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    pub fn id(&self) -> &ProductId { &self.product.id }
    pub fn line_total(&self) -> Money { self.product.price.multiply(self.quantity) }
}

/// Line items keyed by product id. Quantities stay within
/// `1..=max_quantity`; a line never exists with quantity zero.
#[derive(Clone, Debug, Default)]
pub struct Cart {
    items: Vec<CartItem>,
    events: Vec<DomainEvent>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    /// Rebuilds a cart from persisted lines, merging duplicates and dropping
    /// empty lines so a hand-edited store cannot break the invariants.
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            cart.add_item(&item.product, item.quantity);
        }
        cart.events.clear();
        cart
    }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn get(&self, id: &str) -> Option<&CartItem> { self.items.iter().find(|i| i.product.id.as_str() == id) }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn line_count(&self) -> usize { self.items.len() }
    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }
    pub fn subtotal(&self) -> Money { self.items.iter().map(CartItem::line_total).sum() }

    /// Adds `quantity` units, merging into an existing line. Returns the
    /// resulting line quantity (0 when nothing was added).
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> u32 {
        if quantity == 0 { return self.get(product.id.as_str()).map_or(0, |i| i.quantity); }
        let current = self.get(product.id.as_str()).map_or(0, |i| i.quantity);
        let requested = current.saturating_add(quantity);
        let max = product.max_quantity;
        let granted = requested.min(max);
        if granted < requested {
            self.raise_event(DomainEvent::Cart(CartEvent::QuantityCapped { product_id: product.id.clone(), requested, max }));
        }
        if granted == current { return current; }

        if let Some(existing) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            existing.quantity = granted;
        } else {
            self.items.push(CartItem { product: product.clone(), quantity: granted });
        }
        self.raise_event(DomainEvent::Cart(CartEvent::ItemAdded { product_id: product.id.clone(), quantity: granted - current }));
        granted
    }

    /// Overwrites the quantity of an existing line; zero removes it.
    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) -> Result<u32, CartError> {
        if quantity == 0 {
            self.remove_item(product_id)?;
            return Ok(0);
        }
        let item = self.items.iter_mut().find(|i| i.product.id.as_str() == product_id).ok_or(CartError::ItemNotFound)?;
        let max = item.product.max_quantity;
        let granted = quantity.min(max);
        item.quantity = granted;
        let id = item.product.id.clone();
        if granted < quantity {
            self.raise_event(DomainEvent::Cart(CartEvent::QuantityCapped { product_id: id.clone(), requested: quantity, max }));
        }
        self.raise_event(DomainEvent::Cart(CartEvent::QuantityChanged { product_id: id, quantity: granted }));
        Ok(granted)
    }

    pub fn remove_item(&mut self, product_id: &str) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| i.product.id.as_str() != product_id);
        if self.items.len() == before { return Err(CartError::ItemNotFound); }
        self.raise_event(DomainEvent::Cart(CartEvent::ItemRemoved { product_id: product_id.into() }));
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.raise_event(DomainEvent::Cart(CartEvent::Cleared));
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum CartError { ItemNotFound }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "Item not found") }
}

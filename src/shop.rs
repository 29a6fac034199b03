//! Cart, favorites and recently-viewed state for one storefront session.
//!
//! Every mutation writes through to the [`PersistentStore`] immediately. A
//! failed write is logged and the in-memory change stands. Writes made by
//! other handles on the same store (another tab) are picked up with
//! [`ShopState::sync_external_changes`], which reloads the touched
//! collections wholesale.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::aggregates::{Cart, CartItem, Favorites, OrderRecord, Product, ViewedLog};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::{Money, ProductId};
use crate::store::{keys, load_json, save_json, ChangeSet, ExternalChanges, PersistentStore};

pub struct ShopState {
    store: Arc<dyn PersistentStore>,
    changes: ExternalChanges,
    cart: Cart,
    favorites: Favorites,
    viewed: ViewedLog,
}

impl ShopState {
    /// Restores persisted state. Missing or unreadable entries start empty.
    pub fn load(store: Arc<dyn PersistentStore>) -> Self {
        // subscribe first so nothing written during the load is missed
        let changes = store.subscribe();
        let mut state = Self { store, changes, cart: Cart::new(), favorites: Favorites::new(), viewed: ViewedLog::new() };
        state.reload_cart();
        state.reload_favorites();
        state.reload_viewed();
        debug!(lines = state.cart.line_count(), favorites = state.favorites.len(), viewed = state.viewed.len(), "shop state loaded");
        state
    }

    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn cart_items(&self) -> &[CartItem] { self.cart.items() }
    pub fn item_count(&self) -> u32 { self.cart.item_count() }
    pub fn subtotal(&self) -> Money { self.cart.subtotal() }
    pub fn favorites(&self) -> &Favorites { &self.favorites }
    pub fn viewed(&self) -> &ViewedLog { &self.viewed }
    pub fn store(&self) -> &Arc<dyn PersistentStore> { &self.store }

    /// Returns the resulting line quantity, clamped to the product's maximum.
    pub fn add_to_cart(&mut self, product: &Product, quantity: u32) -> u32 {
        let line = self.cart.add_item(product, quantity);
        self.persist_cart();
        line
    }

    pub fn remove_from_cart(&mut self, product_id: &str) {
        if self.cart.remove_item(product_id).is_ok() {
            self.persist_cart();
        }
    }

    /// Zero removes the line. Unknown ids are ignored and yield 0.
    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) -> u32 {
        match self.cart.update_quantity(product_id, quantity) {
            Ok(line) => {
                self.persist_cart();
                line
            }
            Err(e) => {
                debug!(product_id, error = %e, "quantity update ignored");
                0
            }
        }
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.persist_cart();
    }

    /// Returns whether the product is a favorite afterwards.
    pub fn toggle_favorite(&mut self, product_id: &str) -> bool {
        let now = self.favorites.toggle(product_id);
        let ids: Vec<&ProductId> = self.favorites.ids().collect();
        self.persist(keys::FAVORITES, &ids);
        now
    }

    pub fn is_favorite(&self, product_id: &str) -> bool { self.favorites.contains(product_id) }

    pub fn track_product_view(&mut self, product_id: &str) {
        self.viewed.record(product_id);
        let ids: Vec<&ProductId> = self.viewed.ids().collect();
        self.persist(keys::VIEWED_PRODUCTS, &ids);
    }

    /// Local record of accepted orders, oldest first.
    pub fn order_history(&self) -> Vec<OrderRecord> {
        self.read(keys::ORDER_HISTORY).unwrap_or_default()
    }

    /// Appends to the order history. Best effort: failures are only logged.
    pub fn record_order(&self, record: OrderRecord) {
        let mut history = self.order_history();
        history.push(record);
        self.persist(keys::ORDER_HISTORY, &history);
    }

    /// Applies foreign writes that arrived since the last call. Returns
    /// whether anything was reloaded.
    pub fn sync_external_changes(&mut self) -> bool {
        let changes = self.changes.drain();
        self.apply_changes(&changes)
    }

    /// Waits for the next foreign write and applies it. Returns `false` once
    /// the store has no other handles left to write.
    pub async fn next_external_change(&mut self) -> bool {
        match self.changes.next().await {
            Some(changes) => {
                self.apply_changes(&changes);
                true
            }
            None => false,
        }
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { self.cart.take_events() }

    fn apply_changes(&mut self, changes: &ChangeSet) -> bool {
        let mut reloaded = false;
        if changes.touches(keys::CART) {
            self.reload_cart();
            reloaded = true;
        }
        if changes.touches(keys::FAVORITES) {
            self.reload_favorites();
            reloaded = true;
        }
        if changes.touches(keys::VIEWED_PRODUCTS) {
            self.reload_viewed();
            reloaded = true;
        }
        if reloaded {
            debug!(keys = ?changes.keys, overflowed = changes.overflowed, "reloaded state written elsewhere");
        }
        reloaded
    }

    fn reload_cart(&mut self) {
        let items: Vec<CartItem> = self.read(keys::CART).unwrap_or_default();
        self.cart = Cart::from_items(items);
    }

    fn reload_favorites(&mut self) {
        let ids: Vec<ProductId> = self.read(keys::FAVORITES).unwrap_or_default();
        self.favorites = Favorites::from_ids(ids);
    }

    fn reload_viewed(&mut self) {
        let ids: Vec<ProductId> = self.read(keys::VIEWED_PRODUCTS).unwrap_or_default();
        self.viewed = ViewedLog::from_ids(ids);
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match load_json(self.store.as_ref(), key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "failed to read persisted state");
                None
            }
        }
    }

    fn persist<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = save_json(self.store.as_ref(), key, value) {
            warn!(key, error = %e, "failed to persist state");
        }
    }

    fn persist_cart(&self) { self.persist(keys::CART, self.cart.items()); }
}

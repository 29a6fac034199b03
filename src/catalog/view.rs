//! Catalog state as seen by the storefront.
//!
//! Loads are asynchronous and may overlap: a refresh can start before the
//! previous one returns, or the view can be torn down mid-flight. Each load
//! is tagged with a [`LoadTicket`]; only the newest ticket of a live view is
//! applied.

use tracing::debug;

use super::{fetch_catalog, seed, query, CatalogOutcome, FormApi};
use crate::domain::aggregates::Product;
use crate::domain::value_objects::SourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

#[derive(Debug)]
pub struct CatalogView {
    products: Vec<Product>,
    warning: Option<String>,
    generation: u64,
    loading: bool,
    torn_down: bool,
}

impl CatalogView {
    /// Starts out showing the seed catalog until the first load lands.
    pub fn new() -> Self {
        Self { products: seed::seed_catalog(), warning: None, generation: 0, loading: false, torn_down: false }
    }

    /// Marks a load as started and invalidates any earlier ticket.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.loading = true;
        LoadTicket { generation: self.generation }
    }

    /// Installs the outcome if the ticket is still current. Returns whether
    /// it was applied.
    pub fn apply(&mut self, ticket: LoadTicket, outcome: CatalogOutcome) -> bool {
        if self.torn_down || ticket.generation != self.generation {
            debug!(ticket = ticket.generation, current = self.generation, torn_down = self.torn_down, "discarding stale catalog load");
            return false;
        }
        self.products = outcome.products;
        self.warning = outcome.warning;
        self.loading = false;
        true
    }

    /// After teardown no load is ever applied again.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.loading = false;
    }

    /// Begin, fetch and apply in one go.
    pub async fn refresh<A>(&mut self, api: &A, sources: &[SourceId], synthetic_fallback: bool) -> bool
    where
        A: FormApi + ?Sized,
    {
        let ticket = self.begin_load();
        let outcome = fetch_catalog(api, sources, synthetic_fallback).await;
        self.apply(ticket, outcome)
    }

    /// Products fit for display.
    pub fn products(&self) -> Vec<&Product> { query::displayable(&self.products) }
    pub fn all_products(&self) -> &[Product] { &self.products }
    pub fn find(&self, id: &str) -> Option<&Product> { self.products.iter().find(|p| p.id.as_str() == id) }
    pub fn warning(&self) -> Option<&str> { self.warning.as_deref() }
    pub fn is_loading(&self) -> bool { self.loading }
}

impl Default for CatalogView {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::normalize::normalize_product;
    use serde_json::json;

    fn outcome(names: &[&str]) -> CatalogOutcome {
        let products = names
            .iter()
            .enumerate()
            .map(|(i, name)| normalize_product(&json!({"pid": i.to_string(), "name": name, "image": "https://cdn.example.com/x.jpg"}), i))
            .collect();
        CatalogOutcome { products, sources: Vec::new(), warning: None }
    }

    #[test]
    fn test_starts_with_seed() {
        let view = CatalogView::new();
        assert_eq!(view.products().len(), 15);
        assert!(view.find("15").is_some());
        assert!(!view.is_loading());
    }

    #[test]
    fn test_stale_ticket_discarded() {
        let mut view = CatalogView::new();
        let first = view.begin_load();
        let second = view.begin_load();

        assert!(view.apply(second, outcome(&["Fresh"])));
        assert!(!view.apply(first, outcome(&["Stale"])));
        assert_eq!(view.all_products()[0].name, "Fresh");
        assert!(!view.is_loading());
    }

    #[test]
    fn test_teardown_blocks_apply() {
        let mut view = CatalogView::new();
        let ticket = view.begin_load();
        view.teardown();
        assert!(!view.apply(ticket, outcome(&["Late"])));
        assert_eq!(view.all_products().len(), 15);
    }

    #[test]
    fn test_warning_surfaces() {
        let mut view = CatalogView::new();
        let ticket = view.begin_load();
        let mut backup = outcome(&["x"]);
        backup.warning = Some(crate::catalog::FALLBACK_WARNING.to_string());
        view.apply(ticket, backup);
        assert_eq!(view.warning(), Some(crate::catalog::FALLBACK_WARNING));
    }
}

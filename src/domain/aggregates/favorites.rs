//! Favorites and recently viewed products

use std::collections::{BTreeSet, VecDeque};
use crate::domain::value_objects::ProductId;

pub const VIEWED_LOG_CAP: usize = 10;

/// Favorite product ids; toggling flips membership.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Favorites(BTreeSet<ProductId>);

impl Favorites {
    pub fn new() -> Self { Self::default() }
    pub fn from_ids(ids: impl IntoIterator<Item = ProductId>) -> Self { Self(ids.into_iter().collect()) }

    /// Returns whether the id is a favorite after the toggle.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.0.remove(id) { false } else { self.0.insert(id.into()) }
    }

    pub fn contains(&self, id: &str) -> bool { self.0.contains(id) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn ids(&self) -> impl Iterator<Item = &ProductId> { self.0.iter() }
}

/// Most-recent-first product views, deduplicated and capped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewedLog(VecDeque<ProductId>);

impl ViewedLog {
    pub fn new() -> Self { Self::default() }

    pub fn from_ids(ids: impl IntoIterator<Item = ProductId>) -> Self {
        let mut log = Self::new();
        // persisted newest-first, so replay oldest-first
        let ids: Vec<ProductId> = ids.into_iter().collect();
        for id in ids.into_iter().rev() {
            log.record(id.as_str());
        }
        log
    }

    pub fn record(&mut self, id: &str) {
        self.0.retain(|v| v.as_str() != id);
        self.0.push_front(id.into());
        self.0.truncate(VIEWED_LOG_CAP);
    }

    pub fn ids(&self) -> impl Iterator<Item = &ProductId> { self.0.iter() }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(log: &ViewedLog) -> Vec<&str> { log.ids().map(ProductId::as_str).collect() }

    #[test]
    fn test_toggle_twice_restores() {
        let mut favs = Favorites::from_ids(["A".into()]);
        let before = favs.clone();
        assert!(favs.toggle("B"));
        assert!(!favs.toggle("B"));
        assert_eq!(favs, before);
        assert!(!favs.toggle("A"));
        assert!(favs.is_empty());
    }

    #[test]
    fn test_viewed_moves_to_front() {
        let mut log = ViewedLog::new();
        for id in ["A", "B", "A", "C"] { log.record(id); }
        assert_eq!(ids(&log), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_viewed_cap() {
        let mut log = ViewedLog::new();
        for n in 0..15 { log.record(&n.to_string()); }
        assert_eq!(log.len(), VIEWED_LOG_CAP);
        assert_eq!(ids(&log).first(), Some(&"14"));
        assert_eq!(ids(&log).last(), Some(&"5"));
    }

    #[test]
    fn test_from_ids_keeps_order() {
        let log = ViewedLog::from_ids(["C".into(), "A".into(), "B".into(), "A".into()]);
        assert_eq!(ids(&log), vec!["C", "A", "B"]);
    }
}

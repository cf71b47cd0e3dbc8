//! Session-lived multi-select state and the sort-order preference.

use std::collections::HashSet;

use tokio::sync::RwLock;

use crate::model::{PetRecord, SortOrder};

/// A set of selected pet urls.
///
/// Membership is a hash lookup; iteration follows insertion order, which is
/// the order an export walks the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    order: Vec<String>,
    members: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `url` if absent, remove it if present. Returns whether `url` is
    /// selected afterwards.
    pub fn toggle(&mut self, url: &str) -> bool {
        if self.members.remove(url) {
            self.order.retain(|u| u != url);
            false
        } else {
            self.members.insert(url.to_string());
            self.order.push(url.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Select every pet of `catalog` that is not selected yet, in catalog
    /// order. Existing selections are never removed.
    pub fn select_all(&mut self, catalog: &[PetRecord]) -> usize {
        let mut added = 0;
        for pet in catalog {
            if !self.contains(&pet.url) {
                self.toggle(&pet.url);
                added += 1;
            }
        }
        added
    }

    pub fn contains(&self, url: &str) -> bool {
        self.members.contains(url)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.order.clone()
    }
}

#[derive(Debug, Default)]
struct SelectionState {
    selected: SelectionSet,
    sort_order: SortOrder,
}

/// Shared handle over the selection and sort order.
///
/// One instance lives in the application state and is handed to every view;
/// mutations go through these methods only.
#[derive(Debug, Default)]
pub struct SelectionStore {
    inner: RwLock<SelectionState>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn toggle(&self, url: &str) -> bool {
        self.inner.write().await.selected.toggle(url)
    }

    pub async fn clear(&self) {
        self.inner.write().await.selected.clear();
    }

    pub async fn select_all(&self, catalog: &[PetRecord]) -> usize {
        self.inner.write().await.selected.select_all(catalog)
    }

    pub async fn set_sort_order(&self, order: SortOrder) {
        self.inner.write().await.sort_order = order;
    }

    pub async fn sort_order(&self) -> SortOrder {
        self.inner.read().await.sort_order
    }

    pub async fn is_selected(&self, url: &str) -> bool {
        self.inner.read().await.selected.contains(url)
    }

    /// Copy of the current selection.
    pub async fn selection(&self) -> SelectionSet {
        self.inner.read().await.selected.clone()
    }

    /// Selected urls in insertion order.
    pub async fn urls(&self) -> Vec<String> {
        self.inner.read().await.selected.to_vec()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.selected.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.selected.is_empty()
    }
}

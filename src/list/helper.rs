//! Client-side filtering and selection over the currently loaded page.

use std::collections::HashMap;

use crate::models::Entity;

/// Substring filter on an entity's display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFilter {
    pub name: String,
}

impl NameFilter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Case-insensitive containment; an empty filter matches everything.
    pub fn matches<T: Entity>(&self, item: &T) -> bool {
        if self.name.is_empty() {
            return true;
        }
        item.name()
            .to_lowercase()
            .contains(&self.name.to_lowercase())
    }
}

/// Owned view over one page of entities.
///
/// Holds the backing list, the filtered subset and the per-id selection
/// flags. Only the owning controller mutates it.
#[derive(Debug, Clone)]
pub struct ListHelper<T: Entity> {
    items: Vec<T>,
    filter: NameFilter,
    visible: Vec<usize>,
    selection: HashMap<String, bool>,
}

impl<T: Entity> Default for ListHelper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> ListHelper<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            filter: NameFilter::default(),
            visible: Vec::new(),
            selection: HashMap::new(),
        }
    }

    /// Replace the backing list. Selection flags of ids that are gone are dropped.
    pub fn set_list(&mut self, items: Vec<T>) {
        self.selection
            .retain(|id, _| items.iter().any(|item| item.id() == id));
        self.items = items;
        self.recompute_visible();
    }

    pub fn apply_filter(&mut self, filter: NameFilter) {
        self.filter = filter;
        self.recompute_visible();
    }

    pub fn filter(&self) -> &NameFilter {
        &self.filter
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn visible(&self) -> Vec<&T> {
        self.visible.iter().map(|&i| &self.items[i]).collect()
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id() == id)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.get(id).copied().unwrap_or(false)
    }

    /// Set one selection flag. Returns false if the id is not on this page.
    pub fn set_selected(&mut self, id: &str, selected: bool) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.selection.insert(id.to_string(), selected);
        true
    }

    pub fn toggle_selection(&mut self, id: &str) -> bool {
        let next = !self.is_selected(id);
        self.set_selected(id, next)
    }

    pub fn select_all_visible(&mut self) {
        for &i in &self.visible {
            self.selection.insert(self.items[i].id().to_string(), true);
        }
    }

    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }

    pub fn is_all_visible_selected(&self) -> bool {
        !self.visible.is_empty()
            && self
                .visible
                .iter()
                .all(|&i| self.is_selected(self.items[i].id()))
    }

    /// Selected entities among the visible ones, in list order.
    pub fn selected_items(&self) -> Vec<T> {
        self.visible
            .iter()
            .map(|&i| &self.items[i])
            .filter(|item| self.is_selected(item.id()))
            .cloned()
            .collect()
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selected_items()
            .iter()
            .map(|item| item.id().to_string())
            .collect()
    }

    fn recompute_visible(&mut self) {
        self.visible = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.filter.matches(*item))
            .map(|(i, _)| i)
            .collect();
    }
}

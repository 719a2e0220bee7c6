//! Multi-select state for record lists, feeding batch deletes.

use std::collections::HashSet;

use ehsebo_domain::Identifiable;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: HashSet<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips `id` in or out of the selection. Returns `true` if it is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.to_string());
            true
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn select_all<T: Identifiable>(&mut self, items: &[T]) {
        self.selected = items.iter().map(|item| item.id().to_string()).collect();
    }

    /// Clears the selection when every item is selected, selects everything otherwise.
    pub fn toggle_all<T: Identifiable>(&mut self, items: &[T]) {
        if !items.is_empty() && items.iter().all(|item| self.is_selected(item.id())) {
            self.clear();
        } else {
            self.select_all(items);
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Drops ids that no longer match any item.
    pub fn retain_existing<T: Identifiable>(&mut self, items: &[T]) {
        let present: HashSet<&str> = items.iter().map(|item| item.id()).collect();
        self.selected.retain(|id| present.contains(id.as_str()));
    }

    /// Selected ids in the order the items appear.
    pub fn ids_in_order<T: Identifiable>(&self, items: &[T]) -> Vec<String> {
        items
            .iter()
            .map(|item| item.id())
            .filter(|id| self.is_selected(id))
            .map(str::to_string)
            .collect()
    }
}

use indexmap::IndexSet;

use crate::list::ItemKey;

/// Selected row identities plus the "select all" request flag lists react to.
///
/// Owned by the application and passed to lists explicitly.
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    selected: IndexSet<ItemKey>,
    select_all_requested: bool,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_select_all(&mut self) {
        self.select_all_requested = true;
    }

    pub fn should_select_all(&self) -> bool {
        self.select_all_requested
    }

    /// Replaces the selection wholesale.
    pub fn set_selected_items<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = ItemKey>,
    {
        self.selected = keys.into_iter().collect();
    }

    /// Flips one key in or out of the selection. Returns whether it is now selected.
    pub fn toggle(&mut self, key: ItemKey) -> bool {
        if self.selected.shift_remove(&key) {
            false
        } else {
            self.selected.insert(key);
            true
        }
    }

    pub fn is_selected(&self, key: &ItemKey) -> bool {
        self.selected.contains(key)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemKey> {
        self.selected.iter()
    }

    /// Leaves selection mode: drops every key and the pending select-all request.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.select_all_requested = false;
    }
}

//! Store state and its operations
//!
//! `StoreState` is the whole persisted value: the flat item list, the
//! active category and the sort flag. All operations are plain methods on
//! a value owned by the caller; nothing here touches storage.
//!
//! ## Ordering
//!
//! `items` interleaves every category. The relative order of the items of
//! one category is their manual display order. Sorting by rating is a
//! projection computed by [`StoreState::visible_items`] and is never
//! written back.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::{Item, ItemDraft, ItemPatch};

/// Category selected when nothing else is known
pub const DEFAULT_TYPE: &str = "movies";

/// The persisted blob could not be parsed
#[derive(Error, Debug)]
#[error("Invalid store document: {0}")]
pub struct ParseError(#[from] serde_json::Error);

/// Items plus the view flags that survive a reload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    /// All items, every category interleaved
    #[serde(default)]
    pub items: Vec<Item>,
    /// Currently selected category
    #[serde(rename = "type", default = "default_type")]
    pub active_type: String,
    /// Display by rating instead of manual order
    #[serde(default)]
    pub sort_by_rating: bool,
}

/// Wire shape of the persisted document
///
/// `editingId` lives in the view; it is written as `null` so the document
/// keeps its historical shape.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState<'a> {
    items: &'a [Item],
    #[serde(rename = "type")]
    active_type: &'a str,
    editing_id: Option<&'a str>,
    sort_by_rating: bool,
}

impl Serialize for StoreState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PersistedState {
            items: &self.items,
            active_type: &self.active_type,
            editing_id: None,
            sort_by_rating: self.sort_by_rating,
        }
        .serialize(serializer)
    }
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            active_type: default_type(),
            sort_by_rating: false,
        }
    }
}

fn default_type() -> String {
    DEFAULT_TYPE.to_string()
}

impl StoreState {
    /// Parse a persisted document, falling back to defaults
    ///
    /// Absence, an empty string and corrupt data all yield
    /// `StoreState::default()`.
    pub fn load_from(blob: Option<&str>) -> Self {
        let Some(blob) = blob.filter(|b| !b.trim().is_empty()) else {
            return Self::default();
        };

        match Self::parse(blob) {
            Ok(state) => state,
            Err(e) => {
                warn!("Discarding unreadable store document: {}", e);
                Self::default()
            }
        }
    }

    /// Parse a persisted document strictly
    pub fn parse(blob: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(blob)?)
    }

    /// Serialize to the persisted document
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    // ==================== Mutations ====================

    /// Append a new item built from `draft` and return it
    pub fn add(&mut self, draft: ItemDraft) -> Item {
        let item = Item::from_draft(draft);
        self.items.push(item.clone());
        item
    }

    /// Shallow-merge `patch` onto the item with `id`
    ///
    /// Returns `false`, leaving the state untouched, when no item matches.
    pub fn update(&mut self, id: &str, patch: ItemPatch) -> bool {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Remove the item with `id`, returning it if it existed
    pub fn remove(&mut self, id: &str) -> Option<Item> {
        let pos = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Rebuild the slice of `kind` from `ordered_ids`
    ///
    /// The result is every item of another category in its original
    /// relative order, followed by the items of `kind` in the order of
    /// `ordered_ids`. Ids without a matching item of `kind` are skipped and
    /// items of `kind` absent from `ordered_ids` are dropped: the given order
    /// is the new truth for that category.
    pub fn reorder<S: AsRef<str>>(&mut self, kind: &str, ordered_ids: &[S]) {
        let (mut slice, others): (Vec<Item>, Vec<Item>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|i| i.kind == kind);

        let mut rebuilt = Vec::with_capacity(ordered_ids.len());
        for id in ordered_ids {
            if let Some(pos) = slice.iter().position(|i| i.id == id.as_ref()) {
                rebuilt.push(slice.swap_remove(pos));
            }
        }

        self.items = others;
        self.items.extend(rebuilt);
    }

    /// Select the active category
    pub fn set_active_type(&mut self, kind: impl Into<String>) {
        self.active_type = kind.into();
    }

    /// Flip rating sort, returning the new value
    pub fn toggle_sort(&mut self) -> bool {
        self.sort_by_rating = !self.sort_by_rating;
        self.sort_by_rating
    }

    // ==================== Queries ====================

    /// Items of the active category in display order
    pub fn visible_items(&self) -> Vec<&Item> {
        self.visible_items_of(&self.active_type)
    }

    /// Items of `kind` in display order
    ///
    /// With rating sort on this is a stable sort, highest rating first;
    /// ties keep their manual order.
    pub fn visible_items_of(&self, kind: &str) -> Vec<&Item> {
        let mut visible: Vec<&Item> = self.items.iter().filter(|i| i.kind == kind).collect();
        if self.sort_by_rating {
            visible.sort_by_key(|i| std::cmp::Reverse(i.display_rating()));
        }
        visible
    }

    /// Look up an item by exact id
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Categories in first-seen order with their item counts
    pub fn categories(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for item in &self.items {
            match counts.iter_mut().find(|(k, _)| *k == item.kind) {
                Some((_, n)) => *n += 1,
                None => counts.push((item.kind.clone(), 1)),
            }
        }
        counts
    }

    /// Whether every item id is distinct
    pub fn ids_are_unique(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.items.iter().all(|i| seen.insert(i.id.as_str()))
    }
}

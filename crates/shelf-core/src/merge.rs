//! Reconciling an imported snapshot with the current store
//!
//! Two strategies:
//!
//! - **Replace**: the store becomes exactly the imported snapshot. Keys
//!   that only exist locally are lost, including ones shelf does not own.
//! - **Merge**: imported keys overwrite local ones, local-only keys stay.
//!   The shelf state key is merged item by item: items are matched by id
//!   and the imported item wins as a whole (no per-field merge).
//!
//! Values of keys other than the state key are opaque strings and are never
//! merged structurally.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::snapshot::Snapshot;
use crate::state::StoreState;

/// How an imported snapshot is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// Union by key, and by item id under the state key
    #[default]
    Merge,
    /// Wipe, then restore the imported snapshot
    Replace,
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStrategy::Merge => write!(f, "merge"),
            MergeStrategy::Replace => write!(f, "replace"),
        }
    }
}

impl FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" | "m" => Ok(MergeStrategy::Merge),
            "replace" | "r" => Ok(MergeStrategy::Replace),
            other => Err(format!(
                "Unknown strategy '{}'. Use 'merge' or 'replace'.",
                other
            )),
        }
    }
}

/// Compute the store contents after importing `incoming`
pub fn reconcile(
    current: &Snapshot,
    incoming: &Snapshot,
    strategy: MergeStrategy,
    store_key: &str,
) -> Snapshot {
    match strategy {
        MergeStrategy::Replace => incoming.clone(),
        MergeStrategy::Merge => {
            let mut result = current.clone();
            for (key, value) in incoming {
                let merged = match current.get(key) {
                    Some(existing) if key == store_key => merge_state_blobs(existing, value),
                    _ => value.clone(),
                };
                result.insert(key.clone(), merged);
            }
            result
        }
    }
}

/// Merge two persisted state documents
///
/// Falls back to the raw incoming text if either side does not parse.
fn merge_state_blobs(current: &str, incoming: &str) -> String {
    let (current_state, incoming_state) =
        match (StoreState::parse(current), StoreState::parse(incoming)) {
            (Ok(c), Ok(i)) => (c, i),
            (c, i) => {
                if let Err(e) = c {
                    warn!("Local state unreadable during merge, taking imported value: {}", e);
                }
                if let Err(e) = i {
                    warn!("Imported state unreadable, storing it verbatim: {}", e);
                }
                return incoming.to_string();
            }
        };

    match merge_states(current_state, incoming_state).to_json() {
        Ok(merged) => merged,
        Err(e) => {
            warn!("Could not encode merged state, taking imported value: {}", e);
            incoming.to_string()
        }
    }
}

/// Union two states by item id, imported items winning
///
/// Local items keep their positions (replaced in place when the import has
/// the same id); items only in the import are appended in import order.
/// Everything except `items` comes from the import.
pub fn merge_states(current: StoreState, incoming: StoreState) -> StoreState {
    let mut incoming_by_id: HashMap<String, usize> = HashMap::new();
    for (pos, item) in incoming.items.iter().enumerate() {
        incoming_by_id.insert(item.id.clone(), pos);
    }

    let mut taken = vec![false; incoming.items.len()];
    let mut items = Vec::with_capacity(current.items.len() + incoming.items.len());

    for item in current.items {
        match incoming_by_id.get(&item.id) {
            Some(&pos) => {
                if !taken[pos] {
                    taken[pos] = true;
                    items.push(incoming.items[pos].clone());
                }
            }
            None => items.push(item),
        }
    }

    let replaced = taken.iter().filter(|t| **t).count();
    for (pos, item) in incoming.items.iter().enumerate() {
        if !taken[pos] && incoming_by_id.get(&item.id) == Some(&pos) {
            items.push(item.clone());
        }
    }

    debug!(
        "Merged states: {} items, {} replaced from import",
        items.len(),
        replaced
    );

    StoreState {
        items,
        active_type: incoming.active_type,
        sort_by_rating: incoming.sort_by_rating,
    }
}

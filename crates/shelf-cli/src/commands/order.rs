//! Manual ordering command handlers

use anyhow::{bail, Context, Result};

use shelf_core::Store;

use crate::commands::item::resolve_id;
use crate::output::Output;

/// Move one item of the active category to a 1-based position
pub fn move_to(store: &mut Store, id: &str, position: usize, output: &Output) -> Result<()> {
    if position == 0 {
        bail!("Positions start at 1");
    }
    let id = resolve_id(store, id)?;

    store
        .move_item(&id, position - 1)
        .context("Failed to move item")?;

    output.success(&format!("Moved {} to position {}", id, position));
    Ok(())
}

/// Replace the order of the active category
///
/// Items of the category that are not listed are dropped.
pub fn set_order(store: &mut Store, ids: &[String], output: &Output) -> Result<()> {
    if store.state().sort_by_rating {
        bail!("Manual ordering is disabled while sorting by rating. Run `shelf sort` first.");
    }

    let kind = store.state().active_type.clone();
    let mut resolved = Vec::with_capacity(ids.len());
    for id in ids {
        let id = resolve_id(store, id)?;
        if store.get_item(&id).is_some_and(|i| i.kind != kind) {
            bail!("Item {} is not in the current list ({})", id, kind);
        }
        resolved.push(id);
    }

    let before = store.visible_items().len();
    store
        .reorder(&kind, &resolved)
        .context("Failed to reorder items")?;
    let after = store.visible_items().len();

    if after < before {
        output.success(&format!(
            "Reordered {} ({} item(s) dropped)",
            kind,
            before - after
        ));
    } else {
        output.success(&format!("Reordered {}", kind));
    }
    Ok(())
}

//! Item command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use shelf_core::{ItemDraft, ItemPatch, Store};

use crate::editor::confirm;
use crate::image;
use crate::output::{short_id, Output};

/// Field changes requested by `shelf edit`
#[derive(Debug, Default)]
pub struct EditArgs {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub year: Option<String>,
    pub rating: Option<i64>,
    pub image: Option<PathBuf>,
    pub clear_image: bool,
}

/// Add a new item
pub fn add(
    store: &mut Store,
    name: String,
    kind: Option<String>,
    year: Option<String>,
    rating: Option<i64>,
    image: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let name = title_case(&name);
    if name.is_empty() {
        bail!("Item name cannot be empty");
    }

    let kind = kind.unwrap_or_else(|| store.state().active_type.clone());
    let mut draft = ItemDraft::new(kind, name);
    if let Some(year) = year {
        draft = draft.year(year);
    }
    if let Some(rating) = rating {
        draft = draft.rating(rating);
    }
    if let Some(path) = image {
        draft = draft.image(image::to_data_url(&path)?);
    }

    let item = store.add_item(draft).context("Failed to add item")?;

    output.success(&format!("Added {}: {}", item.kind, item.id));
    if !output.is_quiet() {
        output.print_item(&item);
    }

    Ok(())
}

/// List items of the active category, or of `kind`
pub fn list(store: &Store, kind: Option<String>, output: &Output) -> Result<()> {
    let state = store.state();
    let kind = kind.unwrap_or_else(|| state.active_type.clone());
    let items = store.visible_items_of(&kind);

    output.print_items(&kind, state.sort_by_rating, &items);
    Ok(())
}

/// Show a single item
pub fn show(store: &Store, id: &str, output: &Output) -> Result<()> {
    let id = resolve_id(store, id)?;

    let item = store
        .get_item(&id)
        .ok_or_else(|| anyhow::anyhow!("Item not found: {}", id))?;

    output.print_item(item);
    Ok(())
}

/// Edit an item's fields
pub fn edit(store: &mut Store, id: &str, args: EditArgs, output: &Output) -> Result<()> {
    let id = resolve_id(store, id)?;

    let image = if args.clear_image {
        Some(None)
    } else {
        match args.image {
            Some(path) => Some(Some(image::to_data_url(&path)?)),
            None => None,
        }
    };

    let patch = ItemPatch {
        kind: args.kind,
        name: args.name.map(|n| title_case(&n)),
        year: args.year,
        rating: args.rating,
        image,
    };

    if patch.is_empty() {
        bail!("Nothing to change. Pass at least one of --name, --type, --year, --rating, --image or --clear-image.");
    }

    store
        .update_item(&id, patch)
        .context("Failed to update item")?;

    output.success("Item updated");
    if let Some(item) = store.get_item(&id) {
        if !output.is_quiet() {
            output.print_item(item);
        }
    }

    Ok(())
}

/// Delete an item
pub fn delete(store: &mut Store, id: &str, output: &Output) -> Result<()> {
    let id = resolve_id(store, id)?;

    if output.should_prompt() {
        if let Some(item) = store.get_item(&id) {
            println!("Delete {}: {} - {}", item.kind, short_id(&item.id), item.name);
        }
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.delete_item(&id).context("Failed to delete item")?;

    output.success(&format!("Deleted item: {}", id));

    Ok(())
}

/// Resolve an item ID (full or prefix)
pub fn resolve_id(store: &Store, id: &str) -> Result<String> {
    if store.get_item(id).is_some() {
        return Ok(id.to_string());
    }

    let matches = store.find_by_prefix(id);
    match matches.len() {
        0 => bail!("No item matches: {}", id),
        1 => Ok(matches[0].id.clone()),
        _ => {
            eprintln!("Multiple items match '{}':", id);
            for item in &matches {
                eprintln!("  {} - {} ({})", item.id, item.name, item.kind);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

/// Capitalize the first letter of each word, lowercase the rest
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

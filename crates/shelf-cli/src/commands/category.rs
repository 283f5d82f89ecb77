//! Category and sort command handlers

use anyhow::{bail, Context, Result};

use shelf_core::Store;

use crate::output::Output;

/// Switch the active category
pub fn use_type(store: &mut Store, kind: &str, output: &Output) -> Result<()> {
    let kind = kind.trim();
    if kind.is_empty() {
        bail!("Category name cannot be empty");
    }

    store
        .set_active_type(kind)
        .context("Failed to switch category")?;

    let count = store.visible_items().len();
    output.success(&format!("Now showing {} ({} item(s))", kind, count));
    Ok(())
}

/// List categories with item counts
pub fn list(store: &Store, output: &Output) -> Result<()> {
    output.print_categories(&store.categories(), &store.state().active_type);
    Ok(())
}

/// Toggle sorting by rating
pub fn toggle_sort(store: &mut Store, output: &Output) -> Result<()> {
    let sorted = store.toggle_sort().context("Failed to toggle sort")?;

    if sorted {
        output.success("Sorting by rating (highest first)");
    } else {
        output.success("Showing manual order");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use shelf_core::{Config, ItemDraft, MemoryKv};

    fn store() -> Store {
        Store::with_backend(Box::new(MemoryKv::new()), Config::default())
    }

    #[test]
    fn test_use_type_switches_visible_items() {
        let mut store = store();
        store.add_item(ItemDraft::new("series", "Dark")).unwrap();
        let output = Output::new(OutputFormat::Quiet);

        use_type(&mut store, " series ", &output).unwrap();
        assert_eq!(store.state().active_type, "series");
        assert_eq!(store.visible_items().len(), 1);

        assert!(use_type(&mut store, "  ", &output).is_err());
    }

    #[test]
    fn test_toggle_sort() {
        let mut store = store();
        let output = Output::new(OutputFormat::Quiet);

        toggle_sort(&mut store, &output).unwrap();
        assert!(store.state().sort_by_rating);
        toggle_sort(&mut store, &output).unwrap();
        assert!(!store.state().sort_by_rating);
    }
}

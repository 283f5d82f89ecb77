//! Export, import and reset command handlers

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use shelf_core::{ImportError, MergeStrategy, Store, DEFAULT_EXPORT_FILE};

use crate::editor::{confirm, prompt_strategy};
use crate::output::{Output, OutputFormat};

/// Export the whole store to a file
pub fn export(store: &Store, path: Option<PathBuf>, output: &Output) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));
    let snapshot = store.export_to_file(&path)?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "status": "success",
                    "path": path,
                    "keys": snapshot.len()
                })
            );
        }
        OutputFormat::Quiet => println!("{}", path.display()),
        OutputFormat::Human => {
            output.success(&format!(
                "Exported {} key(s) to {}",
                snapshot.len(),
                path.display()
            ));
        }
    }
    Ok(())
}

/// Import an exported file
///
/// Without an explicit strategy the user is asked, falling back to merge
/// when there is nobody to ask.
pub fn import(
    store: &mut Store,
    file: &Path,
    strategy: Option<MergeStrategy>,
    output: &Output,
) -> Result<()> {
    let strategy = match strategy {
        Some(s) => s,
        None if output.should_prompt() => prompt_strategy()?,
        None => MergeStrategy::Merge,
    };

    let summary = match store.import_file(file, strategy) {
        Ok(summary) => summary,
        Err(err) => match err.downcast_ref::<ImportError>() {
            Some(ImportError::InvalidFile(reason)) => {
                bail!("Invalid file {}: {}", file.display(), reason)
            }
            _ => return Err(err),
        },
    };

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "status": "success",
                    "strategy": summary.strategy.to_string(),
                    "imported_keys": summary.imported_keys,
                    "stored_keys": summary.stored_keys,
                    "items": summary.items
                })
            );
        }
        _ => output.success(&format!(
            "Import complete ({}): {} key(s) imported, {} item(s) on the shelf",
            summary.strategy, summary.imported_keys, summary.items
        )),
    }
    Ok(())
}

/// Delete everything in the store
pub fn reset(store: &mut Store, yes: bool, output: &Output) -> Result<()> {
    if !yes {
        if !output.should_prompt() {
            bail!("Refusing to reset without confirmation. Pass --yes.");
        }
        let keys = store.export_all()?.len();
        println!("This deletes {} key(s) from the store.", keys);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.clear().context("Failed to reset store")?;
    output.success("Store cleared");
    Ok(())
}

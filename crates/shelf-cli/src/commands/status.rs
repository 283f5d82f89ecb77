//! Status command handler

use anyhow::Result;

use shelf_core::Store;

use crate::output::{human_bytes, Output, OutputFormat};

/// Show status information
pub fn show(store: &Store, output: &Output) -> Result<()> {
    let stats = store.stats()?;
    let config = store.config();
    let state = store.state();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "active_type": state.active_type,
                    "sort_by_rating": state.sort_by_rating,
                    "store_key": config.store_key,
                    "storage": {
                        "location": config.sqlite_path(),
                        "keys": stats.keys,
                        "used_bytes": stats.used_bytes,
                        "quota_bytes": stats.quota_bytes
                    },
                    "counts": {
                        "items": stats.items,
                        "visible": stats.visible
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", stats.items);
        }
        OutputFormat::Human => {
            println!("shelf Status");
            println!("============");
            println!();
            println!("View:");
            println!("  Category: {}", state.active_type);
            println!(
                "  Order:    {}",
                if state.sort_by_rating {
                    "by rating"
                } else {
                    "manual"
                }
            );
            println!();
            println!("Storage:");
            println!("  Location: {}", config.sqlite_path().display());
            println!("  Key:      {}", config.store_key);
            println!("  Keys:     {}", stats.keys);
            match stats.quota_bytes {
                Some(quota) => println!(
                    "  Size:     {} of {} ({:.0}%)",
                    human_bytes(stats.used_bytes),
                    human_bytes(quota),
                    stats.used_bytes as f64 * 100.0 / quota as f64
                ),
                None => println!("  Size:     {} (no quota)", human_bytes(stats.used_bytes)),
            }
            println!();
            println!("Contents:");
            println!("  Items:    {}", stats.items);
            for (kind, count) in store.categories() {
                println!("    {:<10} {}", kind, count);
            }
        }
    }

    Ok(())
}

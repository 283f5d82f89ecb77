//! Unified storage interface
//!
//! The `Store` owns the in-memory `StoreState` and the `Persistence`
//! gateway. Every mutation is applied to the state and then written
//! through to the durable store.
//!
//! If the write fails the in-memory state keeps the change and the error
//! is returned, so the caller can report that the change was not saved.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open()?;
//!
//! let dune = store.add_item(ItemDraft::new("movies", "Dune").rating(9))?;
//! store.set_active_type("movies")?;
//!
//! for item in store.visible_items() {
//!     println!("{} ({})", item.name, item.display_rating());
//! }
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::config::Config;
use crate::merge::MergeStrategy;
use crate::models::{Item, ItemDraft, ItemPatch};
use crate::snapshot::{self, Snapshot};
use crate::state::StoreState;
use crate::storage::{KeyValueStore, Persistence, SqliteKv};

/// Outcome of an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// Strategy that was applied
    pub strategy: MergeStrategy,
    /// Keys in the imported document
    pub imported_keys: usize,
    /// Keys in the store afterwards
    pub stored_keys: usize,
    /// Items in the shelf state afterwards
    pub items: usize,
}

/// Storage statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub items: usize,
    pub visible: usize,
    pub keys: usize,
    pub used_bytes: u64,
    pub quota_bytes: Option<u64>,
}

/// Unified storage interface for shelf
pub struct Store {
    /// Current state, owned here and handed out by reference
    state: StoreState,
    /// Durable store gateway
    persistence: Persistence,
    /// Configuration
    config: Config,
}

impl Store {
    /// Open the store with the default configuration
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open the SQLite-backed store described by `config`
    pub fn open_with_config(config: Config) -> Result<Self> {
        config.ensure_data_dir()?;
        let kv = SqliteKv::open(&config.sqlite_path(), config.quota())
            .context("Failed to open key-value store")?;
        let persistence = Persistence::new(Box::new(kv), config.store_key.clone());
        let state = persistence.load();

        Ok(Self {
            state,
            persistence,
            config,
        })
    }

    /// Open a store over any backend
    pub fn with_backend(backend: Box<dyn KeyValueStore>, config: Config) -> Self {
        let persistence = Persistence::new(backend, config.store_key.clone());
        let state = persistence.load();
        Self {
            state,
            persistence,
            config,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current state
    pub fn state(&self) -> &StoreState {
        &self.state
    }

    // ==================== Queries ====================

    /// Items of the active category in display order
    pub fn visible_items(&self) -> Vec<&Item> {
        self.state.visible_items()
    }

    /// Items of `kind` in display order
    pub fn visible_items_of(&self, kind: &str) -> Vec<&Item> {
        self.state.visible_items_of(kind)
    }

    /// Get an item by exact ID
    pub fn get_item(&self, id: &str) -> Option<&Item> {
        self.state.get(id)
    }

    /// Items whose ID starts with `prefix`
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<&Item> {
        self.state
            .items
            .iter()
            .filter(|i| i.id.starts_with(prefix))
            .collect()
    }

    /// Configured categories followed by any others in use, with counts
    pub fn categories(&self) -> Vec<(String, usize)> {
        let used = self.state.categories();
        let mut all: Vec<(String, usize)> = self
            .config
            .types
            .iter()
            .map(|kind| {
                let count = used
                    .iter()
                    .find(|(k, _)| k == kind)
                    .map(|(_, n)| *n)
                    .unwrap_or(0);
                (kind.clone(), count)
            })
            .collect();

        for (kind, count) in used {
            if !all.iter().any(|(k, _)| *k == kind) {
                all.push((kind, count));
            }
        }
        if !all.iter().any(|(k, _)| *k == self.state.active_type) {
            all.push((self.state.active_type.clone(), 0));
        }
        all
    }

    // ==================== Mutations ====================

    /// Add a new item
    pub fn add_item(&mut self, draft: ItemDraft) -> Result<Item> {
        let item = self.state.add(draft);
        self.save()?;
        Ok(item)
    }

    /// Update an existing item; returns `false` if no item has `id`
    pub fn update_item(&mut self, id: &str, patch: ItemPatch) -> Result<bool> {
        if !self.state.update(id, patch) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Delete an item, returning it if it existed
    pub fn delete_item(&mut self, id: &str) -> Result<Option<Item>> {
        let removed = self.state.remove(id);
        if removed.is_some() {
            self.save()?;
        }
        Ok(removed)
    }

    /// Rebuild the order of `kind` from the given ids
    pub fn reorder<S: AsRef<str>>(&mut self, kind: &str, ordered_ids: &[S]) -> Result<()> {
        self.state.reorder(kind, ordered_ids);
        self.save()
    }

    /// Move one item of the active category to `position` (0-based)
    ///
    /// The new visible order is handed to `reorder` as a whole, the same
    /// as a drag-and-drop would.
    pub fn move_item(&mut self, id: &str, position: usize) -> Result<()> {
        if self.state.sort_by_rating {
            bail!("Manual ordering is disabled while sorting by rating");
        }

        let mut ids: Vec<String> = self
            .state
            .visible_items()
            .iter()
            .map(|i| i.id.clone())
            .collect();
        let Some(from) = ids.iter().position(|i| i == id) else {
            bail!(
                "Item {} is not in the current list ({})",
                id,
                self.state.active_type
            );
        };

        let moved = ids.remove(from);
        ids.insert(position.min(ids.len()), moved);

        let kind = self.state.active_type.clone();
        self.reorder(&kind, &ids)
    }

    /// Select the active category
    pub fn set_active_type(&mut self, kind: &str) -> Result<()> {
        self.state.set_active_type(kind.trim());
        self.save()
    }

    /// Flip rating sort, returning the new value
    pub fn toggle_sort(&mut self) -> Result<bool> {
        let sorted = self.state.toggle_sort();
        self.save()?;
        Ok(sorted)
    }

    // ==================== Import / Export ====================

    /// Every key of the durable store
    pub fn export_all(&self) -> Result<Snapshot> {
        self.persistence
            .export_all()
            .context("Failed to read store for export")
    }

    /// Export the durable store to a file
    pub fn export_to_file(&self, path: &Path) -> Result<Snapshot> {
        let snapshot = self.export_all()?;
        snapshot::write_file(path, &snapshot)
            .with_context(|| format!("Failed to write export file {:?}", path))?;
        Ok(snapshot)
    }

    /// Import an export document and reload the state
    ///
    /// An unparseable document fails with
    /// [`ImportError`](crate::snapshot::ImportError) before anything is
    /// written.
    pub fn import_document(&mut self, text: &str, strategy: MergeStrategy) -> Result<ImportSummary> {
        let incoming = snapshot::parse_document(text)?;
        self.import_snapshot(&incoming, strategy)
    }

    /// Import an export file and reload the state
    pub fn import_file(&mut self, path: &Path, strategy: MergeStrategy) -> Result<ImportSummary> {
        let incoming = snapshot::read_file(path)?;
        self.import_snapshot(&incoming, strategy)
    }

    fn import_snapshot(&mut self, incoming: &Snapshot, strategy: MergeStrategy) -> Result<ImportSummary> {
        let stored = self
            .persistence
            .import_all(incoming, strategy)
            .context("Failed to write imported data")?;
        self.reload();

        Ok(ImportSummary {
            strategy,
            imported_keys: incoming.len(),
            stored_keys: stored.len(),
            items: self.state.items.len(),
        })
    }

    // ==================== Maintenance ====================

    /// Re-read the state from the durable store
    pub fn reload(&mut self) {
        self.state = self.persistence.load();
    }

    /// Delete everything in the durable store and reset to defaults
    pub fn clear(&mut self) -> Result<()> {
        self.persistence
            .clear()
            .context("Failed to clear store")?;
        self.state = StoreState::default();
        Ok(())
    }

    /// Storage statistics
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            items: self.state.items.len(),
            visible: self.state.visible_items().len(),
            keys: self.export_all()?.len(),
            used_bytes: self.persistence.used_bytes()?,
            quota_bytes: self.config.quota(),
        })
    }

    /// Write the current state
    fn save(&mut self) -> Result<()> {
        self.persistence
            .save(&self.state)
            .context("Failed to save changes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ImportError;
    use crate::storage::{MemoryKv, StorageError};
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    fn memory_store() -> Store {
        Store::with_backend(Box::new(MemoryKv::new()), Config::default())
    }

    fn names(store: &Store) -> Vec<String> {
        store.visible_items().iter().map(|i| i.name.clone()).collect()
    }

    #[test]
    fn test_open_creates_database() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let store = Store::open_with_config(config.clone()).unwrap();

        assert!(config.sqlite_path().exists());
        assert_eq!(store.state(), &StoreState::default());
    }

    #[test]
    fn test_data_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let dune;
        {
            let mut store = Store::open_with_config(config.clone()).unwrap();
            dune = store
                .add_item(ItemDraft::new("movies", "Dune").rating(9))
                .unwrap();
            store.add_item(ItemDraft::new("series", "Dark")).unwrap();
            store.set_active_type("series").unwrap();
            store.toggle_sort().unwrap();
        }

        let store = Store::open_with_config(config).unwrap();
        assert_eq!(store.state().items.len(), 2);
        assert_eq!(store.state().active_type, "series");
        assert!(store.state().sort_by_rating);
        assert_eq!(store.get_item(&dune.id).unwrap().rating, 9);
    }

    #[test]
    fn test_add_update_delete() {
        let mut store = memory_store();

        let item = store.add_item(ItemDraft::new("movies", "Dune")).unwrap();
        assert_eq!(names(&store), vec!["Dune"]);

        let updated = store
            .update_item(
                &item.id,
                ItemPatch {
                    year: Some("2021".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(updated);
        assert_eq!(store.get_item(&item.id).unwrap().year, "2021");

        assert!(!store.update_item("missing", ItemPatch::default()).unwrap());

        let removed = store.delete_item(&item.id).unwrap();
        assert_eq!(removed.unwrap().name, "Dune");
        assert!(store.delete_item(&item.id).unwrap().is_none());
        assert!(store.visible_items().is_empty());
    }

    #[test]
    fn test_mutations_write_through() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let mut store = Store::open_with_config(config.clone()).unwrap();

        store.add_item(ItemDraft::new("movies", "Alien")).unwrap();

        // A second handle on the same database sees the write
        let other = Store::open_with_config(config).unwrap();
        assert_eq!(other.state(), store.state());
    }

    #[test]
    fn test_move_item() {
        let mut store = memory_store();
        let a = store.add_item(ItemDraft::new("movies", "A")).unwrap();
        store.add_item(ItemDraft::new("series", "S")).unwrap();
        store.add_item(ItemDraft::new("movies", "B")).unwrap();
        store.add_item(ItemDraft::new("movies", "C")).unwrap();

        store.move_item(&a.id, 2).unwrap();
        assert_eq!(names(&store), vec!["B", "C", "A"]);

        // out-of-range positions clamp to the end
        store.move_item(&a.id, 0).unwrap();
        store.move_item(&a.id, 99).unwrap();
        assert_eq!(names(&store), vec!["B", "C", "A"]);

        assert_eq!(store.visible_items_of("series").len(), 1);
    }

    #[test]
    fn test_move_item_refused_while_sorted() {
        let mut store = memory_store();
        let a = store.add_item(ItemDraft::new("movies", "A")).unwrap();
        store.toggle_sort().unwrap();

        assert!(store.move_item(&a.id, 0).is_err());
    }

    #[test]
    fn test_move_item_from_other_category_fails() {
        let mut store = memory_store();
        let s = store.add_item(ItemDraft::new("series", "S")).unwrap();
        assert!(store.move_item(&s.id, 0).is_err());
    }

    #[test]
    fn test_categories_include_configured_and_used() {
        let mut store = memory_store();
        store.add_item(ItemDraft::new("books", "Dune")).unwrap();
        store.add_item(ItemDraft::new("movies", "Dune")).unwrap();

        let cats = store.categories();
        assert_eq!(
            cats,
            vec![
                ("movies".to_string(), 1),
                ("series".to_string(), 0),
                ("books".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_save_failure_is_reported() {
        let mut store = Store::with_backend(Box::new(MemoryKv::with_quota(100)), Config::default());

        let result = store.add_item(ItemDraft::new("movies", "Big").image("x".repeat(500)));
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StorageError>(),
            Some(StorageError::QuotaExceeded { .. })
        ));

        // The in-memory state still holds the unsaved item
        assert_eq!(store.state().items.len(), 1);
        store.reload();
        assert!(store.state().items.is_empty());
    }

    #[test]
    fn test_export_import_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let export_path = temp_dir.path().join("backup.json");

        let mut source = memory_store();
        source.add_item(ItemDraft::new("movies", "Dune")).unwrap();
        source.export_to_file(&export_path).unwrap();

        let mut target = memory_store();
        let summary = target
            .import_file(&export_path, MergeStrategy::Replace)
            .unwrap();

        assert_eq!(summary.items, 1);
        assert_eq!(summary.stored_keys, 1);
        assert_eq!(target.state(), source.state());
    }

    #[test]
    fn test_import_merge() {
        let mut store = memory_store();
        let local = store.add_item(ItemDraft::new("movies", "Local")).unwrap();

        let mut remote = StoreState::default();
        let mut shared = local.clone();
        shared.name = "Renamed".to_string();
        remote.items.push(shared);
        remote.add(ItemDraft::new("movies", "Remote"));

        let mut incoming = Snapshot::new();
        incoming.insert("shelf:v1".to_string(), remote.to_json().unwrap());
        incoming.insert("OTHER".to_string(), "v".to_string());
        let document = snapshot::to_document(&incoming);

        let summary = store.import_document(&document, MergeStrategy::Merge).unwrap();
        assert_eq!(summary.imported_keys, 2);
        assert_eq!(summary.stored_keys, 2);
        assert_eq!(names(&store), vec!["Renamed", "Remote"]);
    }

    #[test]
    fn test_import_invalid_document() {
        let mut store = memory_store();
        store.add_item(ItemDraft::new("movies", "Keep")).unwrap();

        let err = store
            .import_document("not json", MergeStrategy::Replace)
            .unwrap_err();
        assert!(err.downcast_ref::<ImportError>().is_some());
        assert_eq!(names(&store), vec!["Keep"]);
    }

    #[test]
    fn test_clear() {
        let mut store = memory_store();
        store.add_item(ItemDraft::new("movies", "Gone")).unwrap();
        store.clear().unwrap();

        assert_eq!(store.state(), &StoreState::default());
        assert!(store.export_all().unwrap().is_empty());
    }

    #[test]
    fn test_stats() {
        let mut store = memory_store();
        store.add_item(ItemDraft::new("movies", "A")).unwrap();
        store.add_item(ItemDraft::new("series", "B")).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.items, 2);
        assert_eq!(stats.visible, 1);
        assert_eq!(stats.keys, 1);
        assert!(stats.used_bytes > 0);
    }
}

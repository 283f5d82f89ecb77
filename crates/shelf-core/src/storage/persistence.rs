//! State persistence
//!
//! Reads and writes the shelf state under one fixed key of a
//! [`KeyValueStore`], and moves whole-store snapshots in and out for
//! export and import.

use tracing::{debug, info, warn};

use crate::merge::{reconcile, MergeStrategy};
use crate::snapshot::Snapshot;
use crate::state::StoreState;
use crate::storage::error::StorageResult;
use crate::storage::kv::KeyValueStore;

/// Key the state is stored under unless configured otherwise
pub const DEFAULT_STORE_KEY: &str = "shelf:v1";

/// Gateway between `StoreState` and the durable key-value store
pub struct Persistence {
    backend: Box<dyn KeyValueStore>,
    key: String,
}

impl Persistence {
    /// Create a gateway storing the state under `key`
    pub fn new(backend: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Write the state with a single `set`
    pub fn save(&mut self, state: &StoreState) -> StorageResult<()> {
        let blob = state.to_json()?;
        self.backend.set(&self.key, &blob)?;
        debug!("Saved {} items under {:?}", state.items.len(), self.key);
        Ok(())
    }

    /// Read the state, falling back to defaults
    ///
    /// Missing, corrupt or unreadable data all yield the default state.
    pub fn load(&self) -> StoreState {
        match self.backend.get(&self.key) {
            Ok(blob) => StoreState::load_from(blob.as_deref()),
            Err(e) => {
                warn!("Failed to read {:?}, starting from defaults: {}", self.key, e);
                StoreState::default()
            }
        }
    }

    /// Every key in the store, not only ours
    pub fn export_all(&self) -> StorageResult<Snapshot> {
        self.backend.entries()
    }

    /// Apply an imported snapshot and return the new store contents
    ///
    /// The reconciled result is written with one `replace_all`, so a failed
    /// import leaves the store as it was.
    pub fn import_all(
        &mut self,
        incoming: &Snapshot,
        strategy: MergeStrategy,
    ) -> StorageResult<Snapshot> {
        let current = self.backend.entries()?;
        let result = reconcile(&current, incoming, strategy, &self.key);
        self.backend.replace_all(&result)?;

        info!(
            "Imported {} keys with {} strategy ({} keys stored)",
            incoming.len(),
            strategy,
            result.len()
        );
        Ok(result)
    }

    /// Remove every key from the store
    pub fn clear(&mut self) -> StorageResult<()> {
        self.backend.clear()?;
        info!("Cleared durable store");
        Ok(())
    }

    /// Bytes currently used in the store
    pub fn used_bytes(&self) -> StorageResult<u64> {
        self.backend.used_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemDraft;
    use crate::storage::error::StorageError;
    use crate::storage::kv::MemoryKv;
    use crate::storage::sqlite::SqliteKv;
    use tempfile::TempDir;

    fn memory() -> Persistence {
        Persistence::new(Box::new(MemoryKv::new()), DEFAULT_STORE_KEY)
    }

    #[test]
    fn test_save_and_load() {
        let mut persistence = memory();
        assert_eq!(persistence.load(), StoreState::default());

        let mut state = StoreState::default();
        state.add(ItemDraft::new("movies", "Dune").rating(9));
        state.set_active_type("series");
        persistence.save(&state).unwrap();

        assert_eq!(persistence.load(), state);
    }

    #[test]
    fn test_save_writes_state_document() {
        let mut persistence = memory();

        let mut state = StoreState::default();
        state.add(ItemDraft::new("books", "Dune"));
        persistence.save(&state).unwrap();

        let stored = persistence.export_all().unwrap();
        let blob = &stored[DEFAULT_STORE_KEY];
        assert!(!blob.is_empty());
        assert_eq!(blob, &state.to_json().unwrap());
        assert_eq!(StoreState::parse(blob).unwrap(), state);
    }

    #[test]
    fn test_load_corrupt_yields_defaults() {
        let mut kv = MemoryKv::new();
        kv.set(DEFAULT_STORE_KEY, "{broken").unwrap();
        let persistence = Persistence::new(Box::new(kv), DEFAULT_STORE_KEY);

        assert_eq!(persistence.load(), StoreState::default());
    }

    #[test]
    fn test_save_surfaces_quota_error() {
        let mut persistence = Persistence::new(Box::new(MemoryKv::with_quota(64)), DEFAULT_STORE_KEY);

        let mut state = StoreState::default();
        state.add(ItemDraft::new("movies", "Dune").image("x".repeat(200)));

        let err = persistence.save(&state).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
    }

    #[test]
    fn test_export_includes_foreign_keys() {
        let mut kv = MemoryKv::new();
        kv.set("theme", "dark").unwrap();
        let mut persistence = Persistence::new(Box::new(kv), DEFAULT_STORE_KEY);
        persistence.save(&StoreState::default()).unwrap();

        let snapshot = persistence.export_all().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["theme"], "dark");
        assert!(snapshot.contains_key(DEFAULT_STORE_KEY));
    }

    #[test]
    fn test_import_replace_wipes_foreign_keys() {
        let mut kv = MemoryKv::new();
        kv.set("theme", "dark").unwrap();
        let mut persistence = Persistence::new(Box::new(kv), DEFAULT_STORE_KEY);

        let mut incoming = Snapshot::new();
        incoming.insert("lang".to_string(), "pt".to_string());

        persistence
            .import_all(&incoming, MergeStrategy::Replace)
            .unwrap();

        assert_eq!(persistence.export_all().unwrap(), incoming);
        assert_eq!(persistence.load(), StoreState::default());
    }

    #[test]
    fn test_import_merge_keeps_foreign_keys() {
        let mut kv = MemoryKv::new();
        kv.set("theme", "dark").unwrap();
        let mut persistence = Persistence::new(Box::new(kv), DEFAULT_STORE_KEY);

        let mut local = StoreState::default();
        local.add(ItemDraft::new("movies", "Local"));
        persistence.save(&local).unwrap();

        let mut remote = StoreState::default();
        remote.add(ItemDraft::new("series", "Remote"));
        let mut incoming = Snapshot::new();
        incoming.insert(DEFAULT_STORE_KEY.to_string(), remote.to_json().unwrap());

        persistence.import_all(&incoming, MergeStrategy::Merge).unwrap();

        let exported = persistence.export_all().unwrap();
        assert_eq!(exported["theme"], "dark");
        assert_eq!(persistence.load().items.len(), 2);
    }

    #[test]
    fn test_sqlite_backend() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("shelf.db");

        let mut state = StoreState::default();
        state.add(ItemDraft::new("movies", "Persisted"));
        {
            let kv = SqliteKv::open(&path, None).unwrap();
            let mut persistence = Persistence::new(Box::new(kv), DEFAULT_STORE_KEY);
            persistence.save(&state).unwrap();
        }

        let kv = SqliteKv::open(&path, None).unwrap();
        let persistence = Persistence::new(Box::new(kv), DEFAULT_STORE_KEY);
        assert_eq!(persistence.load(), state);
    }

    #[test]
    fn test_clear() {
        let mut persistence = memory();
        persistence.save(&StoreState::default()).unwrap();
        persistence.clear().unwrap();
        assert!(persistence.export_all().unwrap().is_empty());
        assert_eq!(persistence.used_bytes().unwrap(), 0);
    }
}

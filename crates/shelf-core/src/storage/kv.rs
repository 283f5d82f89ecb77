//! Durable key-value store abstraction
//!
//! The store holds opaque string values under string keys. shelf keeps its
//! own state under a single key; any other keys belong to someone else and
//! are only ever copied around whole (export, import).

use std::collections::BTreeMap;

use crate::snapshot::Snapshot;
use crate::storage::error::{StorageError, StorageResult};

/// A string-keyed store of string values
pub trait KeyValueStore {
    /// Read the value under `key`
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write `value` under `key` in a single step
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete `key`; absent keys are ignored
    fn remove(&mut self, key: &str) -> StorageResult<()>;

    /// Every key and value currently stored
    fn entries(&self) -> StorageResult<Snapshot>;

    /// Make the store contain exactly `snapshot`, all or nothing
    fn replace_all(&mut self, snapshot: &Snapshot) -> StorageResult<()>;

    /// Delete every key
    fn clear(&mut self) -> StorageResult<()> {
        self.replace_all(&Snapshot::new())
    }

    /// Bytes used by keys and values
    fn used_bytes(&self) -> StorageResult<u64> {
        Ok(snapshot_size(&self.entries()?))
    }
}

/// Key reported when a whole-store write goes over quota
pub const WHOLE_STORE: &str = "<whole store>";

/// Size a key/value pair counts against the quota
pub fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

/// Total size of a snapshot
pub fn snapshot_size(snapshot: &Snapshot) -> u64 {
    snapshot.iter().map(|(k, v)| entry_size(k, v)).sum()
}

/// Fail with `QuotaExceeded` when `needed` is over a non-zero `quota`
pub(crate) fn check_quota(quota: Option<u64>, key: &str, needed: u64) -> StorageResult<()> {
    match quota {
        Some(quota) if quota > 0 && needed > quota => Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            needed,
            quota,
        }),
        _ => Ok(()),
    }
}

/// In-memory store, for tests and embedding
#[derive(Debug, Default, Clone)]
pub struct MemoryKv {
    entries: BTreeMap<String, String>,
    quota: Option<u64>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total size of keys and values
    pub fn with_quota(quota: u64) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(quota),
        }
    }

    /// Start from existing contents
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            entries: snapshot,
            quota: None,
        }
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let others: u64 = self
            .entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| entry_size(k, v))
            .sum();
        check_quota(self.quota, key, others + entry_size(key, value))?;

        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn entries(&self) -> StorageResult<Snapshot> {
        Ok(self.entries.clone())
    }

    fn replace_all(&mut self, snapshot: &Snapshot) -> StorageResult<()> {
        check_quota(self.quota, WHOLE_STORE, snapshot_size(snapshot))?;

        self.entries = snapshot.clone();
        Ok(())
    }
}

//! Export documents
//!
//! An export is a flat JSON object mapping every key of the durable store
//! to its raw string value. It is written to a file for safekeeping and
//! read back by import.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Every key of the durable store with its raw value
pub type Snapshot = BTreeMap<String, String>;

/// File name suggested for exports
pub const DEFAULT_EXPORT_FILE: &str = "shelf-backup.json";

/// Errors reading an export document
#[derive(Error, Debug)]
pub enum ImportError {
    /// Not a JSON object
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    /// The file could not be read
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Render a snapshot as an export document
pub fn to_document(snapshot: &Snapshot) -> String {
    // A map of strings always serializes.
    serde_json::to_string_pretty(snapshot).unwrap_or_else(|_| "{}".to_string())
}

/// Parse an export document
///
/// String values are kept verbatim. Other JSON values are stored as their
/// JSON text, the way they would have been written to the store.
pub fn parse_document(text: &str) -> Result<Snapshot, ImportError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ImportError::InvalidFile(e.to_string()))?;

    let serde_json::Value::Object(map) = value else {
        return Err(ImportError::InvalidFile(
            "expected a JSON object of keys to values".to_string(),
        ));
    };

    Ok(map
        .into_iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => (key, s),
            other => (key, other.to_string()),
        })
        .collect())
}

/// Read and parse an export file
pub fn read_file(path: &Path) -> Result<Snapshot, ImportError> {
    let text = fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&text)
}

/// Write an export file atomically
pub fn write_file(path: &Path, snapshot: &Snapshot) -> io::Result<()> {
    atomic_write(path, to_document(snapshot).as_bytes())
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)
}

//! Storage errors
//!
//! Failures of the durable key-value store, with a hint for the ones a
//! user can do something about.

use std::io;
use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors from key-value store operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// The write would push the store past its byte quota
    #[error("Storage quota exceeded writing '{key}': {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { key: String, needed: u64, quota: u64 },

    /// The directory holding the database could not be created
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The state document could not be encoded
    #[error("Failed to encode store document: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StorageError {
    /// SQLite's primary error code, for database errors
    fn sqlite_code(&self) -> Option<ErrorCode> {
        match self {
            StorageError::Database(rusqlite::Error::SqliteFailure(err, _)) => Some(err.code),
            _ => None,
        }
    }

    /// Whether retrying after user action can succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            StorageError::QuotaExceeded { .. } => true,
            StorageError::Database(_) => matches!(
                self.sqlite_code(),
                Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::DiskFull)
            ),
            _ => false,
        }
    }

    /// What the user can do about this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::QuotaExceeded { .. } => {
                Some("Remove items or images, or raise quota_bytes in the configuration.")
            }
            StorageError::CreateDirectory { .. } => {
                Some("Check that data_dir points to a writable location.")
            }
            StorageError::Database(_) => match self.sqlite_code()? {
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    Some("Another shelf process is using the database. Close it and retry.")
                }
                ErrorCode::DiskFull => Some("Free up disk space and try again."),
                ErrorCode::ReadOnly | ErrorCode::PermissionDenied | ErrorCode::CannotOpen => {
                    Some("Check the permissions of the database file in data_dir.")
                }
                ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt => {
                    Some("The database file is damaged. Restore it from an export.")
                }
                _ => None,
            },
            StorageError::Encode(_) => None,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

//! Storage layer
//!
//! Handles the durable key-value store and the shelf state kept in it.
//!
//! ## Architecture
//!
//! - **KeyValueStore**: string keys to string values, like browser local
//!   storage. SQLite on disk, or a `BTreeMap` in memory.
//! - **Persistence**: the shelf state as one JSON document under one key,
//!   plus whole-store export and import.

pub mod error;
pub mod kv;
pub mod persistence;
pub mod schema;
pub mod sqlite;

pub use error::{StorageError, StorageResult};
pub use kv::{KeyValueStore, MemoryKv};
pub use persistence::{Persistence, DEFAULT_STORE_KEY};
pub use schema::{migrate, schema_version, SCHEMA_VERSION};
pub use sqlite::SqliteKv;

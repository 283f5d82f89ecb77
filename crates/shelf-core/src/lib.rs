//! shelf Core Library
//!
//! This crate provides the core functionality for shelf, a single-user
//! manager for categorized wish-lists ("movies", "series", ...).
//!
//! # Architecture
//!
//! - **StoreState**: the item list plus the active category and sort flag,
//!   changed through plain methods
//! - **Key-value store**: durable string-to-string storage (SQLite); the
//!   whole state lives as one JSON document under one key
//! - **Merge**: reconciles an imported export with the current store
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open()?;
//!
//! // Add an item
//! store.add_item(ItemDraft::new("movies", "Dune").rating(9))?;
//!
//! // Render the current list
//! let items = store.visible_items();
//! ```
//!
//! # Modules
//!
//! - `store`: Unified storage interface (main entry point)
//! - `state`: Store state and its operations
//! - `models`: Items and partial item shapes
//! - `storage`: Key-value backends and state persistence
//! - `merge`: Import reconciliation
//! - `snapshot`: Export documents
//! - `config`: Application configuration

pub mod config;
pub mod id;
pub mod merge;
pub mod models;
pub mod snapshot;
pub mod state;
pub mod storage;
pub mod store;

pub use config::Config;
pub use merge::{reconcile, MergeStrategy};
pub use models::{normalize_rating, Item, ItemDraft, ItemPatch, DEFAULT_RATING};
pub use snapshot::{ImportError, Snapshot, DEFAULT_EXPORT_FILE};
pub use state::{ParseError, StoreState, DEFAULT_TYPE};
pub use storage::{KeyValueStore, MemoryKv, Persistence, SqliteKv, StorageError};
pub use store::{ImportSummary, Store, StoreStats};

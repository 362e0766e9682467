//! Locator-addressed note store
//!
//! A single-process record store exposing CRUD over one SQLite table of
//! notes. Callers address data with [`Locator`]s (the collection, a single
//! item, or a restricted folder view) instead of raw table access, and
//! every locator is classified before anything touches SQL. Mutations
//! publish to a locator-scoped [`ChangeNotifier`], and a single note can be
//! exported as a plain-text byte stream through [`NoteStore::open_stream`].
//!
//! ```no_run
//! use notestore::{Locator, NoteStore, NoteValues, StoreConfig};
//! use serde_json::Value;
//!
//! let store = NoteStore::new(StoreConfig::from_env());
//!
//! let mut values = NoteValues::new();
//! values.insert("title".to_string(), Value::from("Shopping"));
//! values.insert("body".to_string(), Value::from("eggs, milk"));
//! let id = store.insert(&Locator::collection(), values)?;
//!
//! let rows = store.query(&Locator::item(id), None, None, &[], None)?;
//! # Ok::<(), notestore::StoreError>(())
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod locator;
pub mod models;
pub mod notify;
pub mod projection;
pub mod store;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use export::{CONTENT_TYPE_DIR, CONTENT_TYPE_ITEM, NOTE_STREAM_MIME, StreamHandle};
pub use locator::{Locator, LocatorRouter, OperationKind};
pub use models::{Note, NoteValues, Row};
pub use notify::{ChangeNotifier, ChangeObserver, ObserverError, Subscription};
pub use store::{DEFAULT_SORT_ORDER, NoteStore};

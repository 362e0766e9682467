//! Locator construction and classification
//!
//! A locator is an opaque slash-separated address for the notes collection,
//! a single note, or the restricted folder view. Callers build locators;
//! the router only classifies them. Every public store operation classifies
//! first, so a malformed locator never reaches the SQL layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, StoreError};

/// Well-known path of the notes collection.
pub const COLLECTION_PATH: &str = "notes";

/// Well-known path of the folder-view projection.
pub const FOLDER_VIEW_PATH: &str = "folders/notes";

/// Structured address identifying a collection, a single record, or the
/// folder view. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator(String);

impl Locator {
    /// Locator addressing the whole set of notes.
    pub fn collection() -> Self {
        Locator(COLLECTION_PATH.to_string())
    }

    /// Locator addressing a single note by id.
    pub fn item(id: i64) -> Self {
        Locator(format!("{}/{}", COLLECTION_PATH, id))
    }

    /// Locator addressing the restricted folder-view projection.
    pub fn folder_view() -> Self {
        Locator(FOLDER_VIEW_PATH.to_string())
    }

    /// Build a locator from a raw path. No validation happens here;
    /// classification is the router's job.
    pub fn from_path(path: impl Into<String>) -> Self {
        Locator(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if `self` equals `other` or is a segment-boundary prefix of it.
    pub(crate) fn covers(&self, other: &Locator) -> bool {
        if self.0 == other.0 {
            return true;
        }
        other
            .0
            .strip_prefix(self.0.as_str())
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classification result of a locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// The whole notes collection.
    Collection,
    /// One note, with the id extracted from the trailing segment.
    Item(i64),
    /// The restricted folder-view projection.
    FolderView,
}

/// Pattern table mapping locator shapes to operation kinds.
///
/// Built once at construction and passed around explicitly; there is no
/// global registration.
#[derive(Debug, Clone)]
pub struct LocatorRouter {
    collection_path: &'static str,
    folder_view_path: &'static str,
}

impl LocatorRouter {
    pub fn new() -> Self {
        Self {
            collection_path: COLLECTION_PATH,
            folder_view_path: FOLDER_VIEW_PATH,
        }
    }

    /// Classify a locator into an operation kind.
    ///
    /// Patterns are tried in priority order: exact collection path,
    /// collection path plus one numeric segment, exact folder-view path.
    /// Id extraction fails closed: a non-numeric or missing segment where a
    /// numeric one is expected yields `UnknownLocator`, never a default.
    pub fn classify(&self, locator: &Locator) -> Result<OperationKind> {
        let path = locator.as_str();

        if path == self.collection_path {
            return Ok(OperationKind::Collection);
        }

        if let Some(rest) = path.strip_prefix(self.collection_path) {
            if let Some(segment) = rest.strip_prefix('/') {
                if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
                    if let Ok(id) = segment.parse::<i64>() {
                        return Ok(OperationKind::Item(id));
                    }
                }
                return Err(StoreError::UnknownLocator(path.to_string()));
            }
        }

        if path == self.folder_view_path {
            return Ok(OperationKind::FolderView);
        }

        Err(StoreError::UnknownLocator(path.to_string()))
    }
}

impl Default for LocatorRouter {
    fn default() -> Self {
        Self::new()
    }
}

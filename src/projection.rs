//! Projection control
//!
//! Each operation kind exposes a fixed allow-list of columns. The notes map
//! is an identity mapping over the physical columns; the folder-view map is
//! a restricted, renamed subset for the external shortcut consumer.
//! Requested columns absent from a kind's map are silently dropped rather
//! than rejected.

use crate::locator::OperationKind;

/// Physical column names of the notes table.
pub mod columns {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const BODY: &str = "body";
    pub const CREATED_AT: &str = "created_at";
    pub const MODIFIED_AT: &str = "modified_at";
}

/// Renamed labels exposed through the folder-view map.
pub mod folder_columns {
    pub const ITEM_ID: &str = "item_id";
    pub const ITEM_NAME: &str = "item_name";
}

/// One requested-name to select-expression pair.
#[derive(Debug, Clone, Copy)]
struct ColumnMapping {
    requested: &'static str,
    select_expr: &'static str,
}

const NOTES_MAP: &[ColumnMapping] = &[
    ColumnMapping { requested: columns::ID, select_expr: columns::ID },
    ColumnMapping { requested: columns::TITLE, select_expr: columns::TITLE },
    ColumnMapping { requested: columns::BODY, select_expr: columns::BODY },
    ColumnMapping { requested: columns::CREATED_AT, select_expr: columns::CREATED_AT },
    ColumnMapping { requested: columns::MODIFIED_AT, select_expr: columns::MODIFIED_AT },
];

const FOLDER_VIEW_MAP: &[ColumnMapping] = &[
    ColumnMapping { requested: columns::ID, select_expr: "id AS item_id" },
    ColumnMapping { requested: columns::TITLE, select_expr: "title AS item_name" },
];

/// Per-kind projection maps, built once and passed to the store.
#[derive(Debug, Clone)]
pub struct ProjectionTable {
    notes: &'static [ColumnMapping],
    folder_view: &'static [ColumnMapping],
}

impl ProjectionTable {
    pub fn new() -> Self {
        Self {
            notes: NOTES_MAP,
            folder_view: FOLDER_VIEW_MAP,
        }
    }

    fn map_for(&self, kind: OperationKind) -> &'static [ColumnMapping] {
        match kind {
            OperationKind::Collection | OperationKind::Item(_) => self.notes,
            OperationKind::FolderView => self.folder_view,
        }
    }

    /// Resolve a requested column set into physical select expressions.
    ///
    /// Columns absent from the kind's map are dropped without error. An
    /// absent request, or one in which every column was dropped, resolves
    /// to the kind's full map.
    pub fn resolve(&self, kind: OperationKind, requested: Option<&[&str]>) -> Vec<&'static str> {
        let map = self.map_for(kind);
        let full = || map.iter().map(|m| m.select_expr).collect::<Vec<_>>();

        match requested {
            None => full(),
            Some(cols) => {
                let resolved: Vec<&'static str> = cols
                    .iter()
                    .filter_map(|c| {
                        map.iter()
                            .find(|m| m.requested == *c)
                            .map(|m| m.select_expr)
                    })
                    .collect();
                if resolved.is_empty() { full() } else { resolved }
            }
        }
    }
}

impl Default for ProjectionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notes_map_is_identity() {
        let table = ProjectionTable::new();
        let resolved = table.resolve(OperationKind::Collection, Some(&["title", "body"]));
        assert_eq!(resolved, vec!["title", "body"]);
    }

    #[test]
    fn test_absent_request_resolves_full_map() {
        let table = ProjectionTable::new();
        let resolved = table.resolve(OperationKind::Item(1), None);
        assert_eq!(
            resolved,
            vec!["id", "title", "body", "created_at", "modified_at"]
        );
    }

    #[test]
    fn test_unknown_columns_silently_dropped() {
        let table = ProjectionTable::new();
        let resolved = table.resolve(OperationKind::Collection, Some(&["title", "bogus"]));
        assert_eq!(resolved, vec!["title"]);
    }

    #[test]
    fn test_folder_view_renames() {
        let table = ProjectionTable::new();
        let resolved = table.resolve(OperationKind::FolderView, Some(&["id", "title"]));
        assert_eq!(resolved, vec!["id AS item_id", "title AS item_name"]);
    }

    #[test]
    fn test_folder_view_never_exposes_body() {
        let table = ProjectionTable::new();
        // body and timestamps drop out; title survives renamed
        let resolved = table.resolve(
            OperationKind::FolderView,
            Some(&["body", "created_at", "title"]),
        );
        assert_eq!(resolved, vec!["title AS item_name"]);
    }

    #[test]
    fn test_fully_dropped_request_falls_back_to_full_map() {
        let table = ProjectionTable::new();
        let resolved = table.resolve(OperationKind::FolderView, Some(&["body"]));
        assert_eq!(resolved, vec!["id AS item_id", "title AS item_name"]);
    }
}

//! Database handle and schema lifecycle
//!
//! One connection per process, opened lazily on first access and shared by
//! every component; it is never explicitly closed during normal operation.
//! A schema version change is destructive: the notes table is dropped and
//! recreated, discarding old data.

use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::Result;

/// Name of the notes table.
pub const TABLE_NAME: &str = "notes";

/// Current schema version, tracked in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 2;

/// Shared handle to the physical store.
pub struct Database {
    path: PathBuf,
    conn: OnceCell<Mutex<Connection>>,
}

impl Database {
    /// Create a handle. The underlying file is not opened until first use.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            conn: OnceCell::new(),
        }
    }

    /// Get the connection, opening and migrating the database on first
    /// access.
    pub(crate) fn conn(&self) -> Result<&Mutex<Connection>> {
        self.conn.get_or_try_init(|| {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).ok();
                }
            }
            let conn = Connection::open(&self.path)?;
            ensure_schema(&conn)?;
            Ok(Mutex::new(conn))
        })
    }
}

/// Create the notes table, or destructively recreate it when the stored
/// schema version does not match.
fn ensure_schema(conn: &Connection) -> Result<()> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version == SCHEMA_VERSION {
        return Ok(());
    }

    if version != 0 {
        log::warn!(
            "Upgrading database from version {} to {}, which will destroy all old data",
            version,
            SCHEMA_VERSION
        );
        conn.execute(&format!("DROP TABLE IF EXISTS {}", TABLE_NAME), [])?;
    }

    // AUTOINCREMENT keeps ids monotonic so a deleted note's id is never
    // handed to a later insert.
    conn.execute(
        &format!(
            "CREATE TABLE {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT,
                body TEXT,
                created_at INTEGER,
                modified_at INTEGER
            )",
            TABLE_NAME
        ),
        [],
    )?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

    log::info!("Initialized notes table at schema version {}", SCHEMA_VERSION);
    Ok(())
}

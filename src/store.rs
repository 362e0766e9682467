//! Record engine: locator-routed CRUD over the notes table
//!
//! Every public operation classifies its locator first; a malformed locator
//! never reaches the SQL layer. Item-scoped and collection-scoped calls
//! share one execution path: an item locator simply forces an `id =`
//! conjunction onto whatever filter the caller supplies. Mutations publish
//! to the change notifier unconditionally, including zero-row updates and
//! deletes.
//!
//! Filter expressions use positional `?` placeholders bound from
//! `filter_args` in order.

use chrono::Utc;
use rusqlite::ToSql;
use rusqlite::types::ValueRef;
use serde_json::Value;
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::db::Database;
use crate::db::sqlite::TABLE_NAME;
use crate::error::{Result, StoreError};
use crate::locator::{Locator, LocatorRouter, OperationKind};
use crate::models::{Note, NoteValues, Row};
use crate::notify::{ChangeNotifier, ChangeObserver, Subscription};
use crate::projection::{ProjectionTable, columns};

/// Default sort order for listings.
pub const DEFAULT_SORT_ORDER: &str = "modified_at DESC";

/// Locator-addressed note store.
///
/// Owns the router, projection maps, notifier, and the shared database
/// handle. All CRUD is synchronous and blocking on the calling thread;
/// moving calls off latency-sensitive threads is the caller's concern.
pub struct NoteStore {
    db: Arc<Database>,
    router: LocatorRouter,
    projections: ProjectionTable,
    notifier: Arc<ChangeNotifier>,
    config: StoreConfig,
}

impl NoteStore {
    /// Create a store over the configured database path. The database file
    /// itself is opened lazily on first access.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            db: Arc::new(Database::new(&config.database_url)),
            router: LocatorRouter::new(),
            projections: ProjectionTable::new(),
            notifier: Arc::new(ChangeNotifier::new()),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Classify a locator without performing an operation.
    pub fn classify(&self, locator: &Locator) -> Result<OperationKind> {
        self.router.classify(locator)
    }

    /// Query records addressed by a locator.
    ///
    /// `columns` is filtered through the kind's projection map; unknown
    /// names are dropped. Item locators are always constrained to their
    /// embedded id, whatever filter the caller passes. `order_by` defaults
    /// to `modified_at DESC`. Each call prepares and executes a fresh
    /// statement.
    pub fn query(
        &self,
        locator: &Locator,
        columns: Option<&[&str]>,
        filter: Option<&str>,
        filter_args: &[Value],
        order_by: Option<&str>,
    ) -> Result<Vec<Row>> {
        let kind = self.router.classify(locator)?;
        let select = self.projections.resolve(kind, columns);
        let where_clause = scoped_filter(kind, filter);

        let mut sql = format!("SELECT {} FROM {}", select.join(", "), TABLE_NAME);
        if let Some(clause) = &where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(order_by.unwrap_or(DEFAULT_SORT_ORDER));

        let params = sql_params(filter_args);
        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let conn = self.db.conn()?;
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let labels: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let rows = stmt
            .query_map(params_ref.as_slice(), |row| {
                let mut out = Row::new();
                for (i, label) in labels.iter().enumerate() {
                    out.insert(label.clone(), column_value(row.get_ref(i)?));
                }
                Ok(out)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Insert a new note and return its id.
    ///
    /// Only the collection locator may insert. Defaults are applied for
    /// every omitted column before the physical write, then the collection
    /// locator is published.
    pub fn insert(&self, locator: &Locator, values: NoteValues) -> Result<i64> {
        let kind = self.router.classify(locator)?;
        if kind != OperationKind::Collection {
            return Err(StoreError::InvalidOperation(format!(
                "insert is only valid for the collection locator, got {}",
                locator
            )));
        }

        let values = self.apply_insert_defaults(values);

        let mut cols: Vec<&str> = Vec::with_capacity(values.len());
        let mut params: Vec<Box<dyn ToSql>> = Vec::with_capacity(values.len());
        for (col, value) in values.iter() {
            cols.push(col.as_str());
            params.push(json_to_sql(value));
        }
        let placeholders = vec!["?"; cols.len()].join(", ");

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            TABLE_NAME,
            cols.join(", "),
            placeholders
        );
        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let id = {
            let conn = self.db.conn()?;
            let conn = conn.lock().unwrap();
            conn.execute(&sql, params_ref.as_slice())?;
            conn.last_insert_rowid()
        };

        if id <= 0 {
            return Err(StoreError::WriteFailed(format!(
                "insert into {} returned no row id",
                locator
            )));
        }

        self.notifier.publish(&Locator::collection());
        Ok(id)
    }

    /// Update records addressed by a locator, returning the count of rows
    /// changed.
    ///
    /// `modified_at` is set to the current time unless the caller supplies
    /// a value. The original locator is published even when zero rows
    /// matched; observers must not infer a nonzero count from a
    /// notification.
    pub fn update(
        &self,
        locator: &Locator,
        values: NoteValues,
        filter: Option<&str>,
        filter_args: &[Value],
    ) -> Result<usize> {
        let kind = self.router.classify(locator)?;
        if kind == OperationKind::FolderView {
            return Err(StoreError::InvalidOperation(format!(
                "update is not valid for the folder-view locator {}",
                locator
            )));
        }

        let mut values = values;
        if !values.contains_key(columns::MODIFIED_AT) {
            values.insert(
                columns::MODIFIED_AT.to_string(),
                Value::from(Utc::now().timestamp_millis()),
            );
        }

        let mut sets: Vec<String> = Vec::with_capacity(values.len());
        let mut params: Vec<Box<dyn ToSql>> = Vec::with_capacity(values.len() + filter_args.len());
        for (col, value) in values.iter() {
            sets.push(format!("{} = ?", col));
            params.push(json_to_sql(value));
        }
        for arg in filter_args {
            params.push(json_to_sql(arg));
        }

        let where_clause = scoped_filter(kind, filter);
        let mut sql = format!("UPDATE {} SET {}", TABLE_NAME, sets.join(", "));
        if let Some(clause) = &where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }

        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let count = {
            let conn = self.db.conn()?;
            let conn = conn.lock().unwrap();
            conn.execute(&sql, params_ref.as_slice())?
        };

        self.notifier.publish(locator);
        Ok(count)
    }

    /// Delete records addressed by a locator, returning the count of rows
    /// deleted. Deleting an already-absent item yields 0, not an error.
    /// The original locator is published unconditionally.
    pub fn delete(
        &self,
        locator: &Locator,
        filter: Option<&str>,
        filter_args: &[Value],
    ) -> Result<usize> {
        let kind = self.router.classify(locator)?;
        if kind == OperationKind::FolderView {
            return Err(StoreError::InvalidOperation(format!(
                "delete is not valid for the folder-view locator {}",
                locator
            )));
        }

        let where_clause = scoped_filter(kind, filter);
        let mut sql = format!("DELETE FROM {}", TABLE_NAME);
        if let Some(clause) = &where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }

        let params = sql_params(filter_args);
        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let count = {
            let conn = self.db.conn()?;
            let conn = conn.lock().unwrap();
            conn.execute(&sql, params_ref.as_slice())?
        };

        self.notifier.publish(locator);
        Ok(count)
    }

    /// Fetch one note by id through the item locator path.
    pub fn get(&self, id: i64) -> Result<Option<Note>> {
        let rows = self.query(&Locator::item(id), None, None, &[], None)?;
        Ok(rows.first().and_then(Note::from_row))
    }

    /// Register an observer for changes under a locator.
    pub fn subscribe(&self, locator: Locator, observer: Arc<dyn ChangeObserver>) -> Subscription {
        self.notifier.subscribe(locator, observer)
    }

    /// Remove a registration created by [`NoteStore::subscribe`].
    pub fn unsubscribe(&self, subscription: &Subscription) {
        self.notifier.unsubscribe(subscription)
    }

    /// Apply the default-value policy: untitled title, empty body, and
    /// current-time created_at/modified_at for omitted columns.
    fn apply_insert_defaults(&self, mut values: NoteValues) -> NoteValues {
        let now = Utc::now().timestamp_millis();

        if !values.contains_key(columns::CREATED_AT) {
            values.insert(columns::CREATED_AT.to_string(), Value::from(now));
        }
        if !values.contains_key(columns::MODIFIED_AT) {
            values.insert(columns::MODIFIED_AT.to_string(), Value::from(now));
        }
        if !values.contains_key(columns::TITLE) {
            values.insert(
                columns::TITLE.to_string(),
                Value::from(self.config.untitled_title.clone()),
            );
        }
        if !values.contains_key(columns::BODY) {
            values.insert(columns::BODY.to_string(), Value::from(""));
        }

        values
    }
}

/// Conjoin the forced id constraint for item locators with any caller
/// filter. Collection and folder-view locators pass the caller filter
/// through unmodified; an absent filter matches everything.
fn scoped_filter(kind: OperationKind, filter: Option<&str>) -> Option<String> {
    match kind {
        OperationKind::Item(id) => {
            let forced = format!("{} = {}", columns::ID, id);
            Some(match filter {
                Some(f) if !f.trim().is_empty() => format!("{} AND ({})", forced, f),
                _ => forced,
            })
        }
        OperationKind::Collection | OperationKind::FolderView => filter
            .filter(|f| !f.trim().is_empty())
            .map(|f| f.to_string()),
    }
}

/// Convert caller filter arguments into SQL parameters.
fn sql_params(args: &[Value]) -> Vec<Box<dyn ToSql>> {
    args.iter().map(json_to_sql).collect()
}

fn json_to_sql(value: &Value) -> Box<dyn ToSql> {
    match value {
        Value::Null => Box::new(rusqlite::types::Null),
        Value::Bool(b) => Box::new(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Box::new(i)
            } else {
                Box::new(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => Box::new(s.clone()),
        other => Box::new(other.to_string()),
    }
}

/// Convert one SQLite value into its JSON representation.
fn column_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::from(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::from(String::from_utf8_lossy(b).into_owned()),
    }
}

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One projected row, keyed by the requested (possibly renamed) labels.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Caller-supplied column values for insert and update.
pub type NoteValues = serde_json::Map<String, serde_json::Value>;

/// One note record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Note {
    /// Decode a fully-projected row. Returns None when a column is missing
    /// or has the wrong shape.
    pub fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            id: row.get("id")?.as_i64()?,
            title: row.get("title")?.as_str()?.to_string(),
            body: row.get("body")?.as_str()?.to_string(),
            created_at: timestamp_from_millis(row.get("created_at")?.as_i64()?)?,
            modified_at: timestamp_from_millis(row.get("modified_at")?.as_i64()?)?,
        })
    }
}

/// Convert stored epoch milliseconds into a UTC timestamp.
pub(crate) fn timestamp_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_from_row_decodes_full_projection() {
        let mut row = Row::new();
        row.insert("id".to_string(), Value::from(3));
        row.insert("title".to_string(), Value::from("T"));
        row.insert("body".to_string(), Value::from("B"));
        row.insert("created_at".to_string(), Value::from(1_700_000_000_000i64));
        row.insert("modified_at".to_string(), Value::from(1_700_000_000_500i64));

        let note = Note::from_row(&row).expect("row should decode");
        assert_eq!(note.id, 3);
        assert_eq!(note.title, "T");
        assert_eq!(note.body, "B");
        assert_eq!(note.created_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(note.modified_at.timestamp_millis(), 1_700_000_000_500);
    }

    #[test]
    fn test_from_row_rejects_partial_projection() {
        let mut row = Row::new();
        row.insert("id".to_string(), Value::from(3));
        row.insert("title".to_string(), Value::from("T"));

        assert!(Note::from_row(&row).is_none());
    }
}

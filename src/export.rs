//! Streaming export of a single note as a text blob
//!
//! An item locator can be opened as a plain-text stream: the record is read
//! once through the engine, then a background task serializes the title, a
//! blank line, and the body into a bounded byte pipe whose read end is
//! handed to the caller. The writer task owns the write end exclusively and
//! closes it on completion or on write error; it never retries.

use tokio::io::{AsyncWriteExt, DuplexStream};

use crate::error::{Result, StoreError};
use crate::locator::{Locator, OperationKind};
use crate::projection::columns;
use crate::store::NoteStore;

/// MIME type of the streamed note body.
pub const NOTE_STREAM_MIME: &str = "text/plain";

/// MIME label for collection and folder-view locators.
pub const CONTENT_TYPE_DIR: &str = "vnd.notestore.dir/note";

/// MIME label for a single note.
pub const CONTENT_TYPE_ITEM: &str = "vnd.notestore.item/note";

/// Buffered capacity of the export pipe; the writer blocks once the reader
/// falls this many bytes behind.
const PIPE_CAPACITY: usize = 8 * 1024;

/// Read end of an export pipe. End-of-stream is observed when the writer
/// task closes its end.
pub type StreamHandle = DuplexStream;

/// Columns the exporter reads; the order is fixed.
const EXPORT_PROJECTION: &[&str] = &[columns::ID, columns::BODY, columns::TITLE];

impl NoteStore {
    /// MIME label for whatever a locator addresses.
    pub fn content_type(&self, locator: &Locator) -> Result<&'static str> {
        match self.classify(locator)? {
            OperationKind::Collection | OperationKind::FolderView => Ok(CONTENT_TYPE_DIR),
            OperationKind::Item(_) => Ok(CONTENT_TYPE_ITEM),
        }
    }

    /// Stream MIME types available for a locator, filtered by the caller's
    /// pattern (`text/plain`, `text/*`, and `*/*` all match).
    ///
    /// Only item locators can stream; collection and folder-view locators
    /// return None.
    pub fn stream_types(
        &self,
        locator: &Locator,
        mime_filter: &str,
    ) -> Result<Option<Vec<&'static str>>> {
        match self.classify(locator)? {
            OperationKind::Collection | OperationKind::FolderView => Ok(None),
            OperationKind::Item(_) => {
                if mime_matches(mime_filter, NOTE_STREAM_MIME) {
                    Ok(Some(vec![NOTE_STREAM_MIME]))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Open a plain-text stream over the note a locator addresses.
    ///
    /// Reads exactly one record up front and fails with `NotFound` when
    /// nothing matches (or when the locator kind and MIME filter admit no
    /// stream at all). On success a writer task is spawned that owns the
    /// write end of the pipe; dropping the returned handle early surfaces
    /// as a write failure in the task, which then terminates without
    /// retrying. Must be called within a Tokio runtime.
    pub fn open_stream(&self, locator: &Locator, mime_filter: &str) -> Result<StreamHandle> {
        if self.stream_types(locator, mime_filter)?.is_none() {
            return Err(StoreError::NotFound(format!("no stream for {}", locator)));
        }

        let rows = self.query(locator, Some(EXPORT_PROJECTION), None, &[], None)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(format!("unable to query {}", locator)))?;

        let title = row
            .get(columns::TITLE)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let body = row
            .get(columns::BODY)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let (reader, mut writer) = tokio::io::duplex(PIPE_CAPACITY);
        let locator = locator.clone();
        tokio::spawn(async move {
            let payload = format!("{}\n\n{}", title, body);
            if let Err(e) = writer.write_all(payload.as_bytes()).await {
                log::warn!("Export writer for {} stopped: {}", locator, e);
            }
            // Dropping the writer closes the pipe and the reader sees EOF.
        });

        Ok(reader)
    }
}

/// Match a caller MIME pattern against a concrete type.
fn mime_matches(pattern: &str, concrete: &str) -> bool {
    if pattern == "*/*" || pattern == concrete {
        return true;
    }
    match (pattern.split_once('/'), concrete.split_once('/')) {
        (Some((p_type, p_sub)), Some((c_type, _))) => p_type == c_type && p_sub == "*",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::models::NoteValues;
    use serde_json::Value;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    fn test_store() -> (TempDir, NoteStore) {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            database_url: dir
                .path()
                .join("notes.db")
                .to_string_lossy()
                .to_string(),
            untitled_title: "Untitled".to_string(),
        };
        (dir, NoteStore::new(config))
    }

    fn note_values(title: &str, body: &str) -> NoteValues {
        let mut values = NoteValues::new();
        values.insert("title".to_string(), Value::from(title));
        values.insert("body".to_string(), Value::from(body));
        values
    }

    #[test]
    fn test_stream_types_per_kind() {
        let (_dir, store) = test_store();

        assert_eq!(
            store
                .stream_types(&Locator::item(1), NOTE_STREAM_MIME)
                .unwrap(),
            Some(vec![NOTE_STREAM_MIME])
        );
        assert_eq!(
            store.stream_types(&Locator::item(1), "text/*").unwrap(),
            Some(vec![NOTE_STREAM_MIME])
        );
        assert_eq!(
            store.stream_types(&Locator::item(1), "*/*").unwrap(),
            Some(vec![NOTE_STREAM_MIME])
        );
        assert_eq!(
            store.stream_types(&Locator::item(1), "image/png").unwrap(),
            None
        );
        assert_eq!(
            store
                .stream_types(&Locator::collection(), NOTE_STREAM_MIME)
                .unwrap(),
            None
        );
        assert_eq!(
            store
                .stream_types(&Locator::folder_view(), NOTE_STREAM_MIME)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_content_type_per_kind() {
        let (_dir, store) = test_store();

        assert_eq!(
            store.content_type(&Locator::collection()).unwrap(),
            CONTENT_TYPE_DIR
        );
        assert_eq!(
            store.content_type(&Locator::folder_view()).unwrap(),
            CONTENT_TYPE_DIR
        );
        assert_eq!(
            store.content_type(&Locator::item(4)).unwrap(),
            CONTENT_TYPE_ITEM
        );
        assert!(store.content_type(&Locator::from_path("nope")).is_err());
    }

    #[tokio::test]
    async fn test_open_stream_produces_title_blank_line_body() {
        let (_dir, store) = test_store();

        let id = store
            .insert(&Locator::collection(), note_values("Shopping", "eggs\nmilk"))
            .unwrap();

        let mut handle = store
            .open_stream(&Locator::item(id), NOTE_STREAM_MIME)
            .expect("open_stream failed");

        let mut buf = Vec::new();
        handle.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"Shopping\n\neggs\nmilk");
    }

    #[tokio::test]
    async fn test_open_stream_missing_record_is_not_found() {
        let (_dir, store) = test_store();

        let err = store
            .open_stream(&Locator::item(404), NOTE_STREAM_MIME)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_open_stream_rejects_unsupported_kinds_and_filters() {
        let (_dir, store) = test_store();

        let id = store
            .insert(&Locator::collection(), note_values("T", "B"))
            .unwrap();

        assert!(matches!(
            store
                .open_stream(&Locator::collection(), NOTE_STREAM_MIME)
                .unwrap_err(),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            store
                .open_stream(&Locator::item(id), "image/*")
                .unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_payload_larger_than_pipe_capacity_streams_fully() {
        let (_dir, store) = test_store();

        let big_body = "x".repeat(PIPE_CAPACITY * 3);
        let id = store
            .insert(&Locator::collection(), note_values("big", &big_body))
            .unwrap();

        let mut handle = store
            .open_stream(&Locator::item(id), NOTE_STREAM_MIME)
            .unwrap();

        let mut buf = Vec::new();
        handle.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf.len(), "big\n\n".len() + big_body.len());
    }

    #[test]
    fn test_mime_matching() {
        assert!(mime_matches("text/plain", "text/plain"));
        assert!(mime_matches("text/*", "text/plain"));
        assert!(mime_matches("*/*", "text/plain"));
        assert!(!mime_matches("image/*", "text/plain"));
        assert!(!mime_matches("text/html", "text/plain"));
        assert!(!mime_matches("garbage", "text/plain"));
    }
}

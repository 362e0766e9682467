use thiserror::Error;

/// Errors surfaced by the note store.
///
/// None of these are retried or suppressed internally; every failure
/// reaches the caller unchanged. Locator problems are always raised at
/// classification, before any SQL runs.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unknown locator: {0}")]
    UnknownLocator(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("storage error: {0}")]
    WriteFailed(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for index operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("index at {0} is locked by another writer")]
    LockConflict(PathBuf),

    #[error("query error: {0}")]
    Query(String),

    #[error("document not found: segment {segment}, doc {doc}")]
    DocumentNotFound { segment: u64, doc: u32 },

    #[error("tokenization error: {0}")]
    Tokenization(String),
}

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    /// Storage-class failure: I/O, missing or corrupt segment, lock file issues.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            SearchError::Storage(_) | SearchError::Io(_) | SearchError::Serialization(_)
        )
    }

    /// A miss on a single lookup; the snapshot remains usable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SearchError::DocumentNotFound { .. })
    }
}

use std::path::PathBuf;
use thiserror::Error;

/// Errors from search index backends.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Index storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error for index path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Index backend error: {0}")]
    Backend(String),
}

impl IndexError {
    pub fn backend(message: impl Into<String>) -> Self {
        IndexError::Backend(message.into())
    }
}

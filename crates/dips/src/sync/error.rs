use thiserror::Error;

use crate::db::DatabaseError;
use crate::search::IndexError;
use crate::worker::QueueError;

/// Errors on the persist, index and dispatch write path.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Search index error: {0}")]
    Index(#[from] IndexError),

    #[error("Job queue error: {0}")]
    Queue(#[from] QueueError),
}

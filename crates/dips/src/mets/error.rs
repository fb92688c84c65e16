//! Manifest and ingestion error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::models::FieldErrors;
use crate::sync::SyncError;

/// Errors reading or querying a METS document.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read METS file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML parsing error at byte {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("METS document has no root element")]
    NoRoot,

    #[error("Invalid element path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Fatal errors of a METS ingestion run.
///
/// Records persisted before the failing one stay committed.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("DIP {0} does not exist")]
    DipNotFound(i64),

    #[error("An original file in this METS file is missing its UUID.")]
    MissingFileUuid,

    #[error("A PREMISEvent in this METS file is missing its UUID.")]
    MissingEventUuid,

    #[error(
        "An original file in this METS file has the same UUID as an existing one \
         from another DIP ({0})."
    )]
    FileUuidCollision(String),

    #[error(
        "A PREMISEvent in this METS file has the same UUID as an existing one \
         from another file ({0})."
    )]
    EventUuidCollision(String),

    #[error("A {entity} could not be created:\n{errors}")]
    Validation {
        entity: &'static str,
        errors: FieldErrors,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Index synchronization error: {0}")]
    Sync(#[from] SyncError),
}

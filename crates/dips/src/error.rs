use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DipsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("METS error: {0}")]
    Manifest(#[from] crate::mets::ManifestError),

    #[error("Ingestion error: {0}")]
    Ingest(#[from] crate::mets::IngestError),

    #[error("Search index error: {0}")]
    Index(#[from] crate::search::IndexError),

    #[error("Worker error: {0}")]
    Queue(#[from] crate::worker::QueueError),

    #[error("Index synchronization error: {0}")]
    Sync(#[from] crate::sync::SyncError),

    #[error("Invalid {entity}:\n{errors}")]
    Validation {
        entity: &'static str,
        errors: crate::models::FieldErrors,
    },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

pub type Result<T> = std::result::Result<T, DipsError>;

pub mod config;
pub mod db;
pub mod error;
pub mod helpers;
pub mod logging;
pub mod mets;
pub mod models;
pub mod search;
pub mod sync;
pub mod worker;

pub use config::{load_config, Config};
pub use db::Database;
pub use error::{ConfigError, DipsError, Result};
pub use mets::{ingest, IngestError, IngestReport, ManifestError, Mets};
pub use models::{Collection, DigitalFile, Dip, DublinCore, ImportStatus, PremisEvent, Record};
pub use search::{IndexConfig, IndexError, SearchIndex};
pub use sync::{EntityRef, Indexable, IndexSynchronizer, SyncError};
pub use worker::{Job, JobKind, JobQueue, QueueError, WorkerPool};

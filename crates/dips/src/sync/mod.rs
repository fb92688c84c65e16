//! Keeps the search index consistent with relational state.
//!
//! There are no implicit save hooks: every write that must reach the index
//! goes through [`IndexSynchronizer`], which persists the record, writes its
//! projection with an immediate refresh and hands descendant work to the
//! job queue.
//!
//! The "has dependents" checks run against the database before the job is
//! submitted. A child inserted between the check and the job may be missed
//! by that job; the next save of the child indexes it anyway.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

mod error;
mod projection;

pub use error::SyncError;

use crate::db::{collection_repo, dip_repo, file_repo, Database, DatabaseError};
use crate::models::Record;
use crate::search::{
    Document, Refresh, SearchIndex, COLLECTIONS_INDEX, DIGITAL_FILES_INDEX, DIPS_INDEX,
};
use crate::worker::{Job, JobQueue};

/// Identifies an indexed entity across threads and job payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Collection(i64),
    Dip(i64),
    DigitalFile(String),
}

impl EntityRef {
    /// The index the entity's document lives in.
    pub fn index(&self) -> &'static str {
        match self {
            EntityRef::Collection(_) => COLLECTIONS_INDEX,
            EntityRef::Dip(_) => DIPS_INDEX,
            EntityRef::DigitalFile(_) => DIGITAL_FILES_INDEX,
        }
    }

    pub fn document_id(&self) -> String {
        match self {
            EntityRef::Collection(id) | EntityRef::Dip(id) => id.to_string(),
            EntityRef::DigitalFile(uuid) => uuid.clone(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Collection(id) => write!(f, "collection {}", id),
            EntityRef::Dip(id) => write!(f, "DIP {}", id),
            EntityRef::DigitalFile(uuid) => write!(f, "digital file {}", uuid),
        }
    }
}

/// A record with a search document.
pub trait Indexable: Record {
    fn entity_ref(&self) -> EntityRef;

    /// Recomputes the document from current relational state.
    fn projection(&self, db: &Database) -> Result<Document, DatabaseError>;

    /// Whether descendant documents embed data from this record and must
    /// be re-projected after it changes.
    fn cascades_on_update(&self, db: &Database) -> Result<bool, DatabaseError>;

    /// Whether descendant documents must be removed with this record.
    fn cascades_on_delete(&self, db: &Database) -> Result<bool, DatabaseError>;
}

/// Counts returned by [`IndexSynchronizer::reindex_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReindexReport {
    pub collections: usize,
    pub dips: usize,
    pub digital_files: usize,
}

/// The explicit persist, index and dispatch write path.
#[derive(Clone)]
pub struct IndexSynchronizer {
    db: Database,
    index: Arc<dyn SearchIndex>,
    queue: Arc<dyn JobQueue>,
}

impl IndexSynchronizer {
    pub fn new(db: Database, index: Arc<dyn SearchIndex>, queue: Arc<dyn JobQueue>) -> Self {
        Self { db, index, queue }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn index(&self) -> &Arc<dyn SearchIndex> {
        &self.index
    }

    pub fn queue(&self) -> &Arc<dyn JobQueue> {
        &self.queue
    }

    /// Inserts a new record, then indexes it.
    pub fn create<T: Indexable>(&self, new: T::New) -> Result<T, SyncError> {
        let record = T::insert(&self.db, new)?;
        self.after_save(&record)?;
        Ok(record)
    }

    /// Persists changes to an existing record, then indexes it.
    pub fn save<T: Indexable>(&self, record: &T) -> Result<(), SyncError> {
        record.update(&self.db)?;
        self.after_save(record)
    }

    /// Removes the record's document, dispatches descendant cleanup when it
    /// has dependents, then deletes the row.
    ///
    /// The dependents check runs before the relational delete, which
    /// cascades to children and would otherwise always report zero.
    pub fn delete<T: Indexable>(&self, record: T) -> Result<(), SyncError> {
        let entity = record.entity_ref();
        let existed = self
            .index
            .delete(entity.index(), &entity.document_id(), Refresh::Immediate)?;
        if !existed {
            debug!("No document for {} in the index", entity);
        }

        if record.cascades_on_delete(&self.db)? {
            self.queue.submit(Job::delete_descendants(entity.clone()))?;
        }

        record.delete(&self.db)?;
        info!("Deleted {}", entity);
        Ok(())
    }

    /// Writes the record's projection without touching the database or
    /// dispatching jobs.
    pub fn reindex<T: Indexable>(&self, record: &T, refresh: Refresh) -> Result<(), SyncError> {
        let document = record.projection(&self.db)?;
        self.index.upsert(&document, refresh)?;
        Ok(())
    }

    /// Re-projects every collection, DIP and digital file, then refreshes.
    pub fn reindex_all(&self) -> Result<ReindexReport, SyncError> {
        let mut report = ReindexReport::default();

        for collection in collection_repo::list_all(&self.db)? {
            self.reindex(&collection, Refresh::Deferred)?;
            report.collections += 1;
        }
        for dip in dip_repo::list_all(&self.db)? {
            self.reindex(&dip, Refresh::Deferred)?;
            report.dips += 1;
        }
        for file in file_repo::list_all(&self.db)? {
            self.reindex(&file, Refresh::Deferred)?;
            report.digital_files += 1;
        }
        self.index.refresh()?;

        info!(
            "Reindexed {} collections, {} DIPs and {} digital files",
            report.collections, report.dips, report.digital_files
        );
        Ok(report)
    }

    fn after_save<T: Indexable>(&self, record: &T) -> Result<(), SyncError> {
        self.reindex(record, Refresh::Immediate)?;
        if record.cascades_on_update(&self.db)? {
            self.queue
                .submit(Job::update_descendants(record.entity_ref()))?;
        }
        Ok(())
    }
}

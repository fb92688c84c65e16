//! Isolated store, index and queue for integration tests.
//!
//! Jobs are recorded instead of dispatched; [`TestHarness::run_jobs`] runs
//! them on the test thread until the queue is empty, including the jobs
//! they submit themselves.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;

use dips::db::Database;
use dips::mets::{ingest, IngestError, IngestReport, Mets};
use dips::models::{Collection, Dip, NewCollection, NewDip};
use dips::search::{InMemoryIndex, SearchIndex};
use dips::sync::IndexSynchronizer;
use dips::worker::{tasks, JobResult, RecordingQueue};

pub struct TestHarness {
    temp_dir: TempDir,
    pub sync: IndexSynchronizer,
    pub index: Arc<InMemoryIndex>,
    pub queue: Arc<RecordingQueue>,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open(&temp_dir.path().join("dips.db")).expect("Failed to open database");
        let index = Arc::new(InMemoryIndex::new());
        let queue = Arc::new(RecordingQueue::new());
        let sync = IndexSynchronizer::new(db, index.clone(), queue.clone());

        Self {
            temp_dir,
            sync,
            index,
            queue,
        }
    }

    pub fn db(&self) -> &Database {
        self.sync.db()
    }

    pub fn collection(&self, identifier: &str, title: &str) -> Collection {
        let mut new = NewCollection::new(identifier);
        new.dc.title = title.to_string();
        self.sync.create(new).expect("Failed to create collection")
    }

    pub fn dip(&self, collection: &Collection, identifier: &str) -> Dip {
        self.sync
            .create(NewDip::new(collection.id, identifier, format!("{}.zip", identifier)))
            .expect("Failed to create DIP")
    }

    /// Writes `xml` as a METS file in the harness directory.
    pub fn write_mets(&self, name: &str, xml: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, xml).expect("Failed to write METS file");
        path
    }

    pub fn ingest(&self, xml: &str, dip: &Dip) -> Result<IngestReport, IngestError> {
        let mets: Mets = xml.parse()?;
        ingest(&self.sync, &mets, dip.id)
    }

    /// Runs recorded jobs until none are left.
    pub fn run_jobs(&self) -> Vec<JobResult> {
        let mut results = Vec::new();
        loop {
            let jobs = self.queue.drain();
            if jobs.is_empty() {
                return results;
            }
            for job in jobs {
                results.push(tasks::run(&self.sync, &job));
            }
        }
    }

    pub fn doc(&self, index: &str, id: &str) -> Option<Value> {
        self.index.get(index, id).expect("Failed to read index")
    }
}

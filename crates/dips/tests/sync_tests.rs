//! Index synchronization, descendant jobs and the worker pool.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use common::{DcSpec, EventSpec, FileSpec, MetsBuilder, TestHarness};
use dips::db::{dip_repo, dublin_core_repo, file_repo, task_result_repo, Database};
use dips::models::{Collection, Dip, ImportStatus, NewCollection, NewDip};
use dips::search::{
    Document, InMemoryIndex, IndexError, Refresh, SearchIndex, COLLECTIONS_INDEX,
    DIGITAL_FILES_INDEX, DIPS_INDEX,
};
use dips::sync::IndexSynchronizer;
use dips::worker::{tasks, JobKind, RecordingQueue, WorkerPool};

fn sample_mets() -> String {
    MetsBuilder::new()
        .file(FileSpec::new("f-1", "a.txt").event(EventSpec::new("e-1", "ingestion")))
        .file(FileSpec::new("f-2", "b.txt"))
        .dublin_core(DcSpec::new("dmdSec_1", None).field("title", "Imported title"))
        .build()
}

#[test]
fn test_dip_update_refreshes_file_documents() {
    let harness = TestHarness::new();
    let collection = harness.collection("C-1", "Correspondence");
    let dip = harness.dip(&collection, "D-1");
    harness.ingest(&sample_mets(), &dip).unwrap();
    assert!(harness.queue.is_empty());

    let doc = harness.doc(DIGITAL_FILES_INDEX, "f-1").unwrap();
    assert_eq!(doc["dip"]["title"], "Imported title");

    let mut dc = dip.dc(harness.db()).unwrap().unwrap();
    dc.title = "Edited title".into();
    dublin_core_repo::update(harness.db(), &dc).unwrap();
    harness.sync.save(&dip).unwrap();

    let doc = harness.doc(DIPS_INDEX, &dip.id.to_string()).unwrap();
    assert_eq!(doc["dc"]["title"], "Edited title");
    // Descendants are stale until the job runs.
    let doc = harness.doc(DIGITAL_FILES_INDEX, "f-1").unwrap();
    assert_eq!(doc["dip"]["title"], "Imported title");

    let results = harness.run_jobs();
    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    for uuid in ["f-1", "f-2"] {
        let doc = harness.doc(DIGITAL_FILES_INDEX, uuid).unwrap();
        assert_eq!(doc["dip"]["title"], "Edited title");
    }
}

#[test]
fn test_collection_update_refreshes_dips_and_files() {
    let harness = TestHarness::new();
    let collection = harness.collection("C-1", "Old");
    let dip = harness.dip(&collection, "D-1");
    harness.ingest(&sample_mets(), &dip).unwrap();
    let dip_id = dip.id.to_string();

    let dip_row_before = dip_repo::find_by_id(harness.db(), dip.id).unwrap().unwrap();
    let dip_doc_before = harness.doc(DIPS_INDEX, &dip_id).unwrap();
    let file_row_before = file_repo::find_by_uuid(harness.db(), "f-2").unwrap().unwrap();
    let file_doc_before = harness.doc(DIGITAL_FILES_INDEX, "f-2").unwrap();

    let mut dc = collection.dc(harness.db()).unwrap().unwrap();
    dc.title = "New".into();
    dublin_core_repo::update(harness.db(), &dc).unwrap();
    harness.sync.save(&collection).unwrap();
    harness.run_jobs();

    let doc = harness.doc(COLLECTIONS_INDEX, &collection.id.to_string()).unwrap();
    assert_eq!(doc["dc"]["title"], "New");

    // Only the embedded collection summary changes.
    let mut expected = dip_doc_before.clone();
    expected["collection"]["title"] = json!("New");
    assert_eq!(harness.doc(DIPS_INDEX, &dip_id).unwrap(), expected);
    assert_eq!(expected["dc"]["title"], "Imported title");

    let mut expected = file_doc_before.clone();
    expected["collection"]["title"] = json!("New");
    assert_eq!(harness.doc(DIGITAL_FILES_INDEX, "f-2").unwrap(), expected);
    assert_eq!(expected["filepath"], file_doc_before["filepath"]);

    assert_eq!(
        dip_repo::find_by_id(harness.db(), dip.id).unwrap().unwrap(),
        dip_row_before
    );
    assert_eq!(
        file_repo::find_by_uuid(harness.db(), "f-2").unwrap().unwrap(),
        file_row_before
    );
}

#[test]
fn test_empty_collection_update_dispatches_nothing() {
    let harness = TestHarness::new();
    let collection = harness.collection("C-1", "");
    harness.sync.save(&collection).unwrap();
    assert!(harness.queue.is_empty());
}

#[test]
fn test_delete_collection_removes_every_descendant_document() {
    let harness = TestHarness::new();
    let collection = harness.collection("C-1", "");
    let other = harness.collection("C-2", "");
    let dip = harness.dip(&collection, "D-1");
    let kept = harness.dip(&other, "D-2");
    harness.ingest(&sample_mets(), &dip).unwrap();
    harness
        .ingest(
            &MetsBuilder::new().file(FileSpec::new("f-9", "z.txt")).build(),
            &kept,
        )
        .unwrap();

    harness.sync.delete(collection.clone()).unwrap();
    assert!(harness
        .doc(COLLECTIONS_INDEX, &collection.id.to_string())
        .is_none());
    assert!(file_repo::find_by_uuid(harness.db(), "f-1").unwrap().is_none());

    let results = harness.run_jobs();
    assert!(results.iter().all(|r| r.success));
    assert_eq!(harness.index.ids(DIPS_INDEX).unwrap(), vec![kept.id.to_string()]);
    assert_eq!(
        harness.index.ids(DIGITAL_FILES_INDEX).unwrap(),
        vec!["f-9".to_string()]
    );
}

#[test]
fn test_delete_file_has_no_cascade() {
    let harness = TestHarness::new();
    let collection = harness.collection("C-1", "");
    let dip = harness.dip(&collection, "D-1");
    harness.ingest(&sample_mets(), &dip).unwrap();

    let file = file_repo::find_by_uuid(harness.db(), "f-1").unwrap().unwrap();
    harness.sync.delete(file).unwrap();
    assert!(harness.queue.is_empty());
    assert!(harness.doc(DIGITAL_FILES_INDEX, "f-1").is_none());
    assert!(harness.doc(DIGITAL_FILES_INDEX, "f-2").is_some());
}

/// Records, for every document delete, whether the DIP row still existed.
struct DeleteOrderIndex {
    inner: InMemoryIndex,
    db: Database,
    deletes: Mutex<Vec<(String, bool)>>,
}

impl SearchIndex for DeleteOrderIndex {
    fn upsert(&self, document: &Document, refresh: Refresh) -> Result<(), IndexError> {
        self.inner.upsert(document, refresh)
    }

    fn delete(&self, index: &str, id: &str, refresh: Refresh) -> Result<bool, IndexError> {
        if index == DIPS_INDEX {
            let exists = dip_repo::find_by_id(&self.db, id.parse().unwrap())
                .unwrap()
                .is_some();
            self.deletes.lock().unwrap().push((id.to_string(), exists));
        }
        self.inner.delete(index, id, refresh)
    }

    fn delete_by_term(&self, index: &str, field: &str, value: &Value) -> Result<u64, IndexError> {
        self.inner.delete_by_term(index, field, value)
    }

    fn get(&self, index: &str, id: &str) -> Result<Option<Value>, IndexError> {
        self.inner.get(index, id)
    }

    fn count(&self, index: &str) -> Result<u64, IndexError> {
        self.inner.count(index)
    }

    fn refresh(&self) -> Result<(), IndexError> {
        self.inner.refresh()
    }
}

#[test]
fn test_document_deleted_and_cascade_checked_before_row_delete() {
    let db = Database::open_in_memory().unwrap();
    let index = Arc::new(DeleteOrderIndex {
        inner: InMemoryIndex::new(),
        db: db.clone(),
        deletes: Mutex::new(Vec::new()),
    });
    let queue = Arc::new(RecordingQueue::new());
    let sync = IndexSynchronizer::new(db.clone(), index.clone(), queue.clone());

    let collection: Collection = sync.create(NewCollection::new("C-1")).unwrap();
    let dip: Dip = sync
        .create(NewDip::new(collection.id, "D-1", "d.zip"))
        .unwrap();
    let mets: dips::Mets = sample_mets().parse().unwrap();
    dips::mets::ingest(&sync, &mets, dip.id).unwrap();
    queue.drain();

    sync.delete(dip.clone()).unwrap();

    assert_eq!(
        *index.deletes.lock().unwrap(),
        vec![(dip.id.to_string(), true)]
    );
    // Dependents were counted while the files still existed.
    let jobs = queue.drain();
    assert_eq!(jobs.len(), 1);
    assert!(matches!(jobs[0].kind, JobKind::DeleteDescendants(_)));
    assert!(dip_repo::find_by_id(&db, dip.id).unwrap().is_none());

    tasks::run(&sync, &jobs[0]);
    assert_eq!(index.count(DIGITAL_FILES_INDEX).unwrap(), 0);
}

#[test]
fn test_reindex_all_rebuilds_fresh_index() {
    let harness = TestHarness::new();
    let collection = harness.collection("C-1", "");
    let dip = harness.dip(&collection, "D-1");
    harness.ingest(&sample_mets(), &dip).unwrap();

    let fresh = Arc::new(InMemoryIndex::new());
    let sync = IndexSynchronizer::new(
        harness.db().clone(),
        fresh.clone(),
        Arc::new(RecordingQueue::new()),
    );
    let report = sync.reindex_all().unwrap();

    assert_eq!(report.collections, 1);
    assert_eq!(report.dips, 1);
    assert_eq!(report.digital_files, 2);
    assert_eq!(
        fresh.get(DIGITAL_FILES_INDEX, "f-1").unwrap(),
        harness.doc(DIGITAL_FILES_INDEX, "f-1")
    );
}

#[test]
fn test_import_job_through_worker_pool() {
    let harness = TestHarness::new();
    let index = Arc::new(InMemoryIndex::new());
    let pool = WorkerPool::new(harness.db().clone(), index.clone(), 2).unwrap();
    let sync = pool.synchronizer();

    let collection: Collection = sync.create(NewCollection::new("C-1")).unwrap();
    let mut dip: Dip = sync
        .create(NewDip::new(collection.id, "D-1", "d.zip"))
        .unwrap();
    let path = harness.write_mets("METS.xml", &sample_mets());

    let job = tasks::queue_import(sync, &mut dip, path).unwrap();
    assert!(pool.wait_idle(Duration::from_secs(10)));

    let dip = dip_repo::find_by_id(harness.db(), dip.id).unwrap().unwrap();
    assert_eq!(dip.import_status, Some(ImportStatus::Success));
    assert_eq!(dip.import_task_id.as_deref(), Some(job.id.as_str()));
    assert!(dip.is_visible_to(false));

    let result = task_result_repo::find_by_task_id(harness.db(), &job.id)
        .unwrap()
        .unwrap();
    assert_eq!(result.status, task_result_repo::STATUS_SUCCESS);
    assert_eq!(result.traceback, None);

    let doc = index.get(DIPS_INDEX, &dip.id.to_string()).unwrap().unwrap();
    assert_eq!(doc["import_status"], "SUCCESS");
    assert_eq!(doc["dc"]["title"], "Imported title");
    // The status change cascaded to the files.
    let doc = index.get(DIGITAL_FILES_INDEX, "f-1").unwrap().unwrap();
    assert_eq!(doc["dip"]["import_status"], "SUCCESS");

    pool.wait();
}

#[test]
fn test_failed_import_is_recorded() {
    let harness = TestHarness::new();
    let collection = harness.collection("C-1", "");
    let mut dip = harness.dip(&collection, "D-1");
    let xml = MetsBuilder::new().file(FileSpec::new("", "a.txt")).build();
    let path = harness.write_mets("METS.xml", &xml);

    tasks::queue_import(&harness.sync, &mut dip, path).unwrap();
    let stored = dip_repo::find_by_id(harness.db(), dip.id).unwrap().unwrap();
    assert!(!stored.is_visible_to(true));

    let results = harness.run_jobs();
    assert!(!results[0].success);

    let stored = dip_repo::find_by_id(harness.db(), dip.id).unwrap().unwrap();
    assert_eq!(stored.import_status, Some(ImportStatus::Failure));
    assert!(stored.is_visible_to(true));
    assert!(!stored.is_visible_to(false));

    let message = stored.import_error_message(harness.db()).unwrap();
    assert_eq!(
        message,
        "An error occurred during the process executed to extract and parse the METS file. \
         Error trace: An original file in this METS file is missing its UUID. \
         Please, contact an administrator."
    );
}

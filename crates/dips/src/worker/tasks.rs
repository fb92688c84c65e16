//! Job bodies.
//!
//! Every task re-reads what it needs from the database, so a job for an
//! entity deleted in the meantime does nothing.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info, info_span, warn};

use super::job::{Job, JobKind, JobResult};
use crate::db::task_result_repo::{self, TaskResultRow};
use crate::db::{collection_repo, dip_repo, file_repo};
use crate::mets::{ingest, IngestError, IngestReport, Mets};
use crate::models::{Dip, ImportStatus};
use crate::search::{Refresh, DIGITAL_FILES_INDEX, DIPS_INDEX};
use crate::sync::{EntityRef, IndexSynchronizer, SyncError};

/// Runs one job and folds its outcome into a [`JobResult`].
pub fn run(sync: &IndexSynchronizer, job: &Job) -> JobResult {
    let span = info_span!("job", id = %job.id, name = job.name());
    let _enter = span.enter();

    let outcome = match &job.kind {
        JobKind::UpdateDescendants(entity) => update_descendants(sync, entity)
            .map(|count| debug!("Re-projected {} descendants of {}", count, entity))
            .map_err(|e| e.to_string()),
        JobKind::DeleteDescendants(entity) => delete_descendants(sync, entity)
            .map(|count| debug!("Removed {} descendants of {}", count, entity))
            .map_err(|e| e.to_string()),
        JobKind::ImportMets { dip_id, mets_path } => {
            import_mets(sync, &job.id, *dip_id, mets_path)
                .map(|_| ())
                .map_err(|e| e.to_string())
        }
    };

    match outcome {
        Ok(()) => JobResult::success(job),
        Err(e) => {
            error!("Job {} ({}) failed: {}", job.id, job.name(), e);
            JobResult::failure(job, e)
        }
    }
}

/// Re-projects every descendant document of `entity` with deferred
/// visibility, then refreshes once. Returns how many were written.
pub fn update_descendants(
    sync: &IndexSynchronizer,
    entity: &EntityRef,
) -> Result<usize, SyncError> {
    let db = sync.db();
    let mut count = 0;

    match entity {
        EntityRef::Collection(id) => {
            if collection_repo::find_by_id(db, *id)?.is_none() {
                debug!("{} no longer exists", entity);
                return Ok(0);
            }
            for dip in dip_repo::list_by_collection(db, *id)? {
                sync.reindex(&dip, Refresh::Deferred)?;
                count += 1;
            }
            for file in file_repo::list_by_collection(db, *id)? {
                sync.reindex(&file, Refresh::Deferred)?;
                count += 1;
            }
        }
        EntityRef::Dip(id) => {
            if dip_repo::find_by_id(db, *id)?.is_none() {
                debug!("{} no longer exists", entity);
                return Ok(0);
            }
            for file in file_repo::list_by_dip(db, *id)? {
                sync.reindex(&file, Refresh::Deferred)?;
                count += 1;
            }
        }
        EntityRef::DigitalFile(_) => return Ok(0),
    }

    sync.index().refresh()?;
    Ok(count)
}

/// Removes every descendant document of `entity` from the index.
pub fn delete_descendants(
    sync: &IndexSynchronizer,
    entity: &EntityRef,
) -> Result<u64, SyncError> {
    let index = sync.index();
    let removed = match entity {
        EntityRef::Collection(id) => {
            let value = Value::from(*id);
            index.delete_by_term(DIPS_INDEX, "collection.id", &value)?
                + index.delete_by_term(DIGITAL_FILES_INDEX, "collection.id", &value)?
        }
        EntityRef::Dip(id) => {
            index.delete_by_term(DIGITAL_FILES_INDEX, "dip.id", &Value::from(*id))?
        }
        EntityRef::DigitalFile(_) => 0,
    };
    Ok(removed)
}

/// Marks `dip` as pending, records the task id on it and submits the
/// import job.
pub fn queue_import(
    sync: &IndexSynchronizer,
    dip: &mut Dip,
    mets_path: PathBuf,
) -> Result<Job, SyncError> {
    let job = Job::import_mets(dip.id, mets_path);
    dip.import_task_id = Some(job.id.clone());
    dip.import_status = Some(ImportStatus::Pending);
    sync.save(dip)?;
    sync.queue().submit(job.clone())?;
    info!("Queued METS import {} for DIP {}", job.id, dip.id);
    Ok(job)
}

/// Ingests the METS file, then stores the outcome on the DIP and as a task
/// result, whether or not ingestion succeeded.
pub fn import_mets(
    sync: &IndexSynchronizer,
    task_id: &str,
    dip_id: i64,
    mets_path: &Path,
) -> Result<IngestReport, IngestError> {
    let outcome = Mets::open(mets_path)
        .map_err(IngestError::from)
        .and_then(|mets| ingest(sync, &mets, dip_id));

    let (status, traceback) = match &outcome {
        Ok(_) => (ImportStatus::Success, None),
        Err(e) => (ImportStatus::Failure, Some(e.to_string())),
    };

    match dip_repo::find_by_id(sync.db(), dip_id)? {
        Some(mut dip) => {
            dip.import_status = Some(status);
            sync.save(&dip)?;
        }
        None => warn!("DIP {} no longer exists; import status not stored", dip_id),
    }

    task_result_repo::upsert(
        sync.db(),
        &TaskResultRow {
            task_id: task_id.to_string(),
            task_name: "import_mets".to_string(),
            status: status.as_str().to_string(),
            traceback,
            date_done: Utc::now(),
        },
    )?;

    info!("METS import {} for DIP {} finished: {}", task_id, dip_id, status);
    outcome
}

//! METS ingestion: turns a parsed manifest into DigitalFile, PREMISEvent and
//! Dublin Core updates for one DIP.
//!
//! Ingestion is sequential and every record is written in its own
//! transaction. An error aborts the run but keeps whatever was persisted
//! before it, so re-running the same manifest completes the import.

use std::collections::HashMap;

use super::dublin_core;
use super::error::{IngestError, ManifestError};
use super::extract::{
    compile, extract, FieldPaths, RawFields, AMD_SECTIONS, FILE_ELEMENTS, ORIGINAL_FILES,
    PREMIS_ELEMENTS, PREMIS_EVENTS,
};
use super::path::ElementPath;
use super::transform::{EventFields, FileFields};
use super::xml::Element;
use super::Mets;
use crate::db::{dip_repo, dublin_core_repo, event_repo, file_repo, Database};
use crate::models::{DigitalFile, Dip, DublinCore, PremisEvent};
use crate::sync::IndexSynchronizer;

/// Counts of what an ingestion run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files_created: usize,
    pub files_updated: usize,
    pub events_created: usize,
    pub events_updated: usize,
    pub dc_updated: bool,
}

impl IngestReport {
    pub fn files(&self) -> usize {
        self.files_created + self.files_updated
    }

    pub fn events(&self) -> usize {
        self.events_created + self.events_updated
    }
}

/// Ingests `mets` into the DIP with id `dip_id`.
///
/// Files are persisted through `sync` so their index documents follow.
/// Events and the Dublin Core record are not indexed on their own.
pub fn ingest(
    sync: &IndexSynchronizer,
    mets: &Mets,
    dip_id: i64,
) -> Result<IngestReport, IngestError> {
    let db = sync.db();
    let dip = dip_repo::find_by_id(db, dip_id)?.ok_or(IngestError::DipNotFound(dip_id))?;
    let dc = dip.dc(db)?;
    let identifier = dc.as_ref().map(|d| d.identifier.clone()).unwrap_or_default();

    let span = tracing::info_span!("ingest_mets", dip_id, identifier = %identifier);
    let _enter = span.enter();

    log::info!(
        "Starting METS parsing process for DIP [Identifier: {}]",
        identifier
    );

    let root = mets.root();
    let queries = Queries::compile()?;
    let amdsecs = index_amdsecs(root)?;
    let mut report = IngestReport::default();

    for file_element in root.select(ORIGINAL_FILES)? {
        let admid = file_element.attr("ADMID").unwrap_or_default();
        log::info!(
            "Parsing original file metadata from AMD section [ADMID: {}]",
            admid
        );

        let (raw_file, raw_events) = parse_file_metadata(&amdsecs, admid, &queries);
        let file = upsert_file(sync, &dip, &FileFields::from_raw(&raw_file), &mut report)?;

        for raw_event in &raw_events {
            upsert_event(db, &file, &EventFields::from_raw(raw_event), &mut report)?;
        }
    }

    update_dublin_core(db, &dip, dc, root, &mut report)?;

    log::info!(
        "Finished METS parsing for DIP {}: {} files, {} events",
        dip.id,
        report.files(),
        report.events()
    );
    Ok(report)
}

/// Paths shared by every original file of a run.
struct Queries {
    file_fields: FieldPaths,
    event_fields: FieldPaths,
    events: ElementPath,
}

impl Queries {
    fn compile() -> Result<Self, ManifestError> {
        Ok(Self {
            file_fields: compile(FILE_ELEMENTS)?,
            event_fields: compile(PREMIS_ELEMENTS)?,
            events: ElementPath::parse(PREMIS_EVENTS)?,
        })
    }
}

/// `amdSec` elements by `ID`, each list in document order.
fn index_amdsecs(root: &Element) -> Result<HashMap<&str, Vec<&Element>>, ManifestError> {
    let mut by_id: HashMap<&str, Vec<&Element>> = HashMap::new();
    for amdsec in root.select(AMD_SECTIONS)? {
        if let Some(id) = amdsec.attr("ID") {
            by_id.entry(id).or_default().push(amdsec);
        }
    }
    Ok(by_id)
}

/// Collects the raw file fields and the raw PREMIS events of the `amdSec`
/// referenced by `admid`.
fn parse_file_metadata(
    amdsecs: &HashMap<&str, Vec<&Element>>,
    admid: &str,
    queries: &Queries,
) -> (RawFields, Vec<RawFields>) {
    let mut data = RawFields::new();
    data.insert("amdsec", admid.to_string());
    let mut events = Vec::new();

    if admid.is_empty() {
        return (data, events);
    }

    for amdsec in amdsecs.get(admid).into_iter().flatten() {
        data.extend(extract(amdsec, &queries.file_fields));
        for event in amdsec.find_all(&queries.events) {
            events.push(extract(event, &queries.event_fields));
        }
    }

    (data, events)
}

fn upsert_file(
    sync: &IndexSynchronizer,
    dip: &Dip,
    fields: &FileFields,
    report: &mut IngestReport,
) -> Result<DigitalFile, IngestError> {
    if fields.uuid.is_empty() {
        return Err(IngestError::MissingFileUuid);
    }

    let existing = file_repo::find_by_uuid(sync.db(), &fields.uuid)?;
    let is_new = existing.is_none();
    let mut file = match existing {
        Some(file) if file.dip_id != dip.id => {
            return Err(IngestError::FileUuidCollision(fields.uuid.clone()));
        }
        Some(file) => {
            log::info!("Updating DigitalFile [UUID: {}]", fields.uuid);
            file
        }
        None => {
            log::info!("Creating DigitalFile [UUID: {}]", fields.uuid);
            DigitalFile::new(fields.uuid.clone(), dip.id)
        }
    };

    file.dip_id = dip.id;
    fields
        .merge_into(&mut file)
        .map_err(|errors| IngestError::Validation {
            entity: "DigitalFile",
            errors,
        })?;

    if is_new {
        let file = sync.create::<DigitalFile>(file)?;
        report.files_created += 1;
        Ok(file)
    } else {
        sync.save(&file)?;
        report.files_updated += 1;
        Ok(file)
    }
}

fn upsert_event(
    db: &Database,
    file: &DigitalFile,
    fields: &EventFields,
    report: &mut IngestReport,
) -> Result<(), IngestError> {
    if fields.uuid.is_empty() {
        return Err(IngestError::MissingEventUuid);
    }

    let existing = event_repo::find_by_uuid(db, &fields.uuid)?;
    let is_new = existing.is_none();
    let mut event = match existing {
        Some(event) if event.digitalfile_uuid != file.uuid => {
            return Err(IngestError::EventUuidCollision(fields.uuid.clone()));
        }
        Some(event) => {
            log::info!("Updating PREMISEvent [UUID: {}]", fields.uuid);
            event
        }
        None => {
            log::info!("Creating PREMISEvent [UUID: {}]", fields.uuid);
            PremisEvent::new(fields.uuid.clone(), file.uuid.clone())
        }
    };

    fields
        .merge_into(&mut event)
        .map_err(|errors| IngestError::Validation {
            entity: "PREMISEvent",
            errors,
        })?;

    if is_new {
        event_repo::insert(db, &event)?;
        report.events_created += 1;
    } else {
        event_repo::update(db, &event)?;
        report.events_updated += 1;
    }
    Ok(())
}

fn update_dublin_core(
    db: &Database,
    dip: &Dip,
    dc: Option<DublinCore>,
    root: &Element,
    report: &mut IngestReport,
) -> Result<(), IngestError> {
    let Some(values) = dublin_core::resolve(root)? else {
        log::info!("No DIP Dublin Core metadata found");
        return Ok(());
    };

    let Some(mut dc) = dc else {
        log::warn!(
            "DIP {} has no Dublin Core record; skipping metadata update",
            dip.id
        );
        return Ok(());
    };

    // Stored as found in the manifest, without length checks.
    log::info!("Updating DIP Dublin Core metadata");
    dc.apply(&values);
    dublin_core_repo::update(db, &dc)?;
    report.dc_updated = true;
    Ok(())
}

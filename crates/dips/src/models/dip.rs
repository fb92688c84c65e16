//! A dissemination information package and its import state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Collection, DublinCore, Record};
use crate::db::{collection_repo, dip_repo, dublin_core_repo, task_result_repo};
use crate::db::{Database, DatabaseError};

/// Used in place of the trace when the task result is gone.
pub const MISSING_TASK_RESULT: &str = "A related task result could not be found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportStatus {
    Pending,
    Success,
    Failure,
}

impl ImportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportStatus::Pending => "PENDING",
            ImportStatus::Success => "SUCCESS",
            ImportStatus::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ImportStatus::Pending),
            "SUCCESS" => Ok(ImportStatus::Success),
            "FAILURE" => Ok(ImportStatus::Failure),
            other => Err(format!("unknown import status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dip {
    pub id: i64,
    pub objectszip: String,
    pub uploaded: DateTime<Utc>,
    pub collection_id: i64,
    pub dc_id: Option<i64>,
    pub import_task_id: Option<String>,
    pub import_status: Option<ImportStatus>,
}

/// Values needed to create a DIP together with its metadata.
#[derive(Debug, Clone)]
pub struct NewDip {
    pub collection_id: i64,
    pub objectszip: String,
    pub dc: DublinCore,
    pub import_task_id: Option<String>,
    pub import_status: Option<ImportStatus>,
}

impl NewDip {
    pub fn new(
        collection_id: i64,
        identifier: impl Into<String>,
        objectszip: impl Into<String>,
    ) -> Self {
        Self {
            collection_id,
            objectszip: objectszip.into(),
            dc: DublinCore::new(identifier),
            import_task_id: None,
            import_status: None,
        }
    }
}

impl Dip {
    pub fn dc(&self, db: &Database) -> Result<Option<DublinCore>, DatabaseError> {
        match self.dc_id {
            Some(id) => dublin_core_repo::find_by_id(db, id),
            None => Ok(None),
        }
    }

    pub fn collection(&self, db: &Database) -> Result<Option<Collection>, DatabaseError> {
        collection_repo::find_by_id(db, self.collection_id)
    }

    /// `{id, import_status?, identifier?, title?}` as embedded in file documents.
    pub fn summary(&self, db: &Database) -> Result<Map<String, Value>, DatabaseError> {
        let mut map = Map::new();
        map.insert("id".into(), Value::from(self.id));
        if let Some(status) = self.import_status {
            map.insert("import_status".into(), Value::from(status.as_str()));
        }
        if let Some(dc) = self.dc(db)? {
            map.extend(dc.summary());
        }
        Ok(map)
    }

    pub fn file_count(&self, db: &Database) -> Result<u64, DatabaseError> {
        dip_repo::count_files(db, self.id)
    }

    /// Pending imports are hidden from everyone, failed ones from
    /// non-editors.
    pub fn is_visible_to(&self, is_editor: bool) -> bool {
        match self.import_status {
            Some(ImportStatus::Pending) => false,
            Some(ImportStatus::Failure) => is_editor,
            _ => true,
        }
    }

    /// Describes why the import failed, using the recorded task result
    /// when it still exists.
    pub fn import_error_message(&self, db: &Database) -> Result<String, DatabaseError> {
        let result = match &self.import_task_id {
            Some(task_id) => task_result_repo::find_by_task_id(db, task_id)?,
            None => None,
        };
        let error = match result {
            Some(result) => format!(
                "Error trace: {}",
                result.traceback.unwrap_or_default()
            ),
            None => MISSING_TASK_RESULT.to_string(),
        };
        Ok(format!(
            "An error occurred during the process executed to extract and parse the METS \
             file. {} Please, contact an administrator.",
            error
        ))
    }
}

impl Record for Dip {
    type New = NewDip;

    fn insert(db: &Database, new: NewDip) -> Result<Self, DatabaseError> {
        dip_repo::insert(db, &new)
    }

    fn update(&self, db: &Database) -> Result<(), DatabaseError> {
        dip_repo::update(db, self)
    }

    fn delete(self, db: &Database) -> Result<(), DatabaseError> {
        dip_repo::delete(db, self.id)
    }
}

//! A file inside a DIP, described by its METS technical metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::FieldErrors;
use super::{Dip, PremisEvent, Record};
use crate::db::{dip_repo, event_repo, file_repo, Database, DatabaseError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalFile {
    pub uuid: String,
    pub filepath: String,
    pub fileformat: String,
    pub formatversion: Option<String>,
    pub size_bytes: i64,
    pub size_human: String,
    pub datemodified: Option<DateTime<Utc>>,
    pub puid: String,
    pub amdsec: String,
    pub hashtype: String,
    pub hashvalue: String,
    pub dip_id: i64,
}

impl DigitalFile {
    /// Creates an unsaved, blank file record owned by `dip_id`.
    pub fn new(uuid: impl Into<String>, dip_id: i64) -> Self {
        Self {
            uuid: uuid.into(),
            filepath: String::new(),
            fileformat: String::new(),
            formatversion: None,
            size_bytes: 0,
            size_human: String::new(),
            datemodified: None,
            puid: String::new(),
            amdsec: String::new(),
            hashtype: String::new(),
            hashvalue: String::new(),
            dip_id,
        }
    }

    pub fn dip(&self, db: &Database) -> Result<Option<Dip>, DatabaseError> {
        dip_repo::find_by_id(db, self.dip_id)
    }

    pub fn events(&self, db: &Database) -> Result<Vec<PremisEvent>, DatabaseError> {
        event_repo::list_by_file(db, &self.uuid)
    }

    /// Checks the column constraints, reporting every violation.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("uuid", &self.uuid);
        errors.max_length("uuid", &self.uuid, 36);
        errors.require("filepath", &self.filepath);
        errors.require("fileformat", &self.fileformat);
        errors.max_length("fileformat", &self.fileformat, 200);
        if let Some(version) = &self.formatversion {
            errors.max_length("formatversion", version, 200);
        }
        errors.max_length("size_human", &self.size_human, 10);
        errors.max_length("puid", &self.puid, 200);
        errors.require("amdsec", &self.amdsec);
        errors.max_length("amdsec", &self.amdsec, 12);
        errors.require("hashtype", &self.hashtype);
        errors.max_length("hashtype", &self.hashtype, 7);
        errors.require("hashvalue", &self.hashvalue);
        errors.max_length("hashvalue", &self.hashvalue, 128);
        errors.into_result()
    }
}

impl Record for DigitalFile {
    type New = DigitalFile;

    fn insert(db: &Database, new: DigitalFile) -> Result<Self, DatabaseError> {
        file_repo::insert(db, &new)?;
        Ok(new)
    }

    fn update(&self, db: &Database) -> Result<(), DatabaseError> {
        file_repo::update(db, self)
    }

    fn delete(self, db: &Database) -> Result<(), DatabaseError> {
        file_repo::delete(db, &self.uuid)
    }
}

//! A group of DIPs with its own descriptive metadata.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{DublinCore, Record};
use crate::db::{collection_repo, dublin_core_repo, Database, DatabaseError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: i64,
    pub link: String,
    pub dc_id: Option<i64>,
}

/// Values needed to create a collection together with its metadata.
#[derive(Debug, Clone)]
pub struct NewCollection {
    pub link: String,
    pub dc: DublinCore,
}

impl NewCollection {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            link: String::new(),
            dc: DublinCore::new(identifier),
        }
    }
}

impl Collection {
    pub fn dc(&self, db: &Database) -> Result<Option<DublinCore>, DatabaseError> {
        match self.dc_id {
            Some(id) => dublin_core_repo::find_by_id(db, id),
            None => Ok(None),
        }
    }

    /// `{id, identifier?, title?}` as embedded in descendant documents.
    pub fn summary(&self, db: &Database) -> Result<Map<String, Value>, DatabaseError> {
        let mut map = Map::new();
        map.insert("id".into(), Value::from(self.id));
        if let Some(dc) = self.dc(db)? {
            map.extend(dc.summary());
        }
        Ok(map)
    }

    pub fn dip_count(&self, db: &Database) -> Result<u64, DatabaseError> {
        collection_repo::count_dips(db, self.id)
    }

    /// The identifier when metadata exists, otherwise the id.
    pub fn display_name(&self, db: &Database) -> Result<String, DatabaseError> {
        Ok(match self.dc(db)? {
            Some(dc) => dc.identifier,
            None => self.id.to_string(),
        })
    }
}

impl Record for Collection {
    type New = NewCollection;

    fn insert(db: &Database, new: NewCollection) -> Result<Self, DatabaseError> {
        collection_repo::insert(db, &new)
    }

    fn update(&self, db: &Database) -> Result<(), DatabaseError> {
        collection_repo::update(db, self)
    }

    fn delete(self, db: &Database) -> Result<(), DatabaseError> {
        collection_repo::delete(db, self.id)
    }
}

//! Index projections of the indexed entities.
//!
//! Every document is recomputed from relational state. Ancestor data comes
//! from the summary projections so that descendant documents only carry
//! identifying fields.

use chrono::SecondsFormat;
use serde_json::{Map, Value};

use super::{EntityRef, Indexable};
use crate::db::{collection_repo, dip_repo, Database, DatabaseError};
use crate::models::{add_if_not_empty, Collection, DigitalFile, Dip};
use crate::search::{Document, COLLECTIONS_INDEX, DIGITAL_FILES_INDEX, DIPS_INDEX};

/// `{id, identifier?, title?}` for the collection `id`, falling back to the
/// bare id when the row is gone.
fn collection_summary(db: &Database, id: i64) -> Result<Value, DatabaseError> {
    let summary = match collection_repo::find_by_id(db, id)? {
        Some(collection) => collection.summary(db)?,
        None => {
            let mut map = Map::new();
            map.insert("id".into(), Value::from(id));
            map
        }
    };
    Ok(Value::Object(summary))
}

impl Indexable for Collection {
    fn entity_ref(&self) -> EntityRef {
        EntityRef::Collection(self.id)
    }

    fn projection(&self, db: &Database) -> Result<Document, DatabaseError> {
        let mut source = Map::new();
        if let Some(dc) = self.dc(db)? {
            source.insert("dc".into(), Value::Object(dc.inner_data()));
        }
        Ok(Document {
            index: COLLECTIONS_INDEX,
            id: self.id.to_string(),
            source: Value::Object(source),
        })
    }

    fn cascades_on_update(&self, db: &Database) -> Result<bool, DatabaseError> {
        Ok(collection_repo::count_dips(db, self.id)? > 0)
    }

    fn cascades_on_delete(&self, db: &Database) -> Result<bool, DatabaseError> {
        self.cascades_on_update(db)
    }
}

impl Indexable for Dip {
    fn entity_ref(&self) -> EntityRef {
        EntityRef::Dip(self.id)
    }

    fn projection(&self, db: &Database) -> Result<Document, DatabaseError> {
        let mut source = Map::new();
        if let Some(status) = self.import_status {
            source.insert("import_status".into(), Value::from(status.as_str()));
        }
        if let Some(task_id) = &self.import_task_id {
            add_if_not_empty(&mut source, "import_task_id", task_id);
        }
        if let Some(dc) = self.dc(db)? {
            source.insert("dc".into(), Value::Object(dc.inner_data()));
        }
        source.insert(
            "collection".into(),
            collection_summary(db, self.collection_id)?,
        );
        Ok(Document {
            index: DIPS_INDEX,
            id: self.id.to_string(),
            source: Value::Object(source),
        })
    }

    fn cascades_on_update(&self, db: &Database) -> Result<bool, DatabaseError> {
        Ok(dip_repo::count_files(db, self.id)? > 0)
    }

    fn cascades_on_delete(&self, db: &Database) -> Result<bool, DatabaseError> {
        self.cascades_on_update(db)
    }
}

impl Indexable for DigitalFile {
    fn entity_ref(&self) -> EntityRef {
        EntityRef::DigitalFile(self.uuid.clone())
    }

    fn projection(&self, db: &Database) -> Result<Document, DatabaseError> {
        let mut source = Map::new();
        source.insert("uuid".into(), Value::from(self.uuid.as_str()));
        source.insert("filepath".into(), Value::from(self.filepath.as_str()));
        source.insert("fileformat".into(), Value::from(self.fileformat.as_str()));
        source.insert("size_bytes".into(), Value::from(self.size_bytes));
        if let Some(modified) = self.datemodified {
            source.insert(
                "datemodified".into(),
                Value::from(modified.to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
        }

        match self.dip(db)? {
            Some(dip) => {
                source.insert("dip".into(), Value::Object(dip.summary(db)?));
                source.insert(
                    "collection".into(),
                    collection_summary(db, dip.collection_id)?,
                );
            }
            None => {
                let mut dip = Map::new();
                dip.insert("id".into(), Value::from(self.dip_id));
                source.insert("dip".into(), Value::Object(dip));
            }
        }

        Ok(Document {
            index: DIGITAL_FILES_INDEX,
            id: self.uuid.clone(),
            source: Value::Object(source),
        })
    }

    fn cascades_on_update(&self, _db: &Database) -> Result<bool, DatabaseError> {
        Ok(false)
    }

    fn cascades_on_delete(&self, _db: &Database) -> Result<bool, DatabaseError> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::file_repo;
    use crate::models::{ImportStatus, NewCollection, NewDip, Record};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn fixture() -> (Database, Collection, Dip, DigitalFile) {
        let db = Database::open_in_memory().unwrap();
        let mut new = NewCollection::new("C-1");
        new.dc.title = "Correspondence".into();
        new.dc.date = "1901-1950".into();
        let collection = Collection::insert(&db, new).unwrap();

        let mut new = NewDip::new(collection.id, "D-1", "d1.zip");
        new.dc.title = "Letters".into();
        new.dc.creator = "Ana".into();
        new.import_status = Some(ImportStatus::Success);
        new.import_task_id = Some("task-1".into());
        let dip = Dip::insert(&db, new).unwrap();

        let mut file = DigitalFile::new("f-1", dip.id);
        file.filepath = "objects/letter.pdf".into();
        file.fileformat = "Acrobat PDF 1.4".into();
        file.size_bytes = 2048;
        file.datemodified = Some(Utc.with_ymd_and_hms(2017, 2, 3, 4, 5, 6).unwrap());
        file.amdsec = "amdSec_1".into();
        file.hashtype = "md5".into();
        file.hashvalue = "00".into();
        file_repo::insert(&db, &file).unwrap();

        (db, collection, dip, file)
    }

    #[test]
    fn test_collection_projection() {
        let (db, collection, _, _) = fixture();
        let doc = collection.projection(&db).unwrap();
        assert_eq!(doc.index, COLLECTIONS_INDEX);
        assert_eq!(doc.id, collection.id.to_string());
        assert_eq!(
            doc.source,
            json!({"dc": {"identifier": "C-1", "title": "Correspondence", "date": "1901-1950"}})
        );
    }

    #[test]
    fn test_dip_projection() {
        let (db, collection, dip, _) = fixture();
        let doc = dip.projection(&db).unwrap();
        assert_eq!(
            doc.source,
            json!({
                "import_status": "SUCCESS",
                "import_task_id": "task-1",
                "dc": {"identifier": "D-1", "title": "Letters"},
                "collection": {"id": collection.id, "identifier": "C-1", "title": "Correspondence"},
            })
        );
    }

    #[test]
    fn test_file_projection() {
        let (db, collection, dip, file) = fixture();
        let doc = file.projection(&db).unwrap();
        assert_eq!(doc.id, "f-1");
        assert_eq!(
            doc.source,
            json!({
                "uuid": "f-1",
                "filepath": "objects/letter.pdf",
                "fileformat": "Acrobat PDF 1.4",
                "size_bytes": 2048,
                "datemodified": "2017-02-03T04:05:06Z",
                "dip": {"id": dip.id, "import_status": "SUCCESS", "identifier": "D-1", "title": "Letters"},
                "collection": {"id": collection.id, "identifier": "C-1", "title": "Correspondence"},
            })
        );
    }

    #[test]
    fn test_cascade_predicates() {
        let (db, collection, dip, file) = fixture();
        assert!(collection.cascades_on_update(&db).unwrap());
        assert!(dip.cascades_on_update(&db).unwrap());
        assert!(dip.cascades_on_delete(&db).unwrap());
        assert!(!file.cascades_on_update(&db).unwrap());

        let empty = Collection::insert(&db, NewCollection::new("C-2")).unwrap();
        assert!(!empty.cascades_on_update(&db).unwrap());
        assert!(!empty.cascades_on_delete(&db).unwrap());
    }
}

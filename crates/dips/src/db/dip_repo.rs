//! DIP repository: CRUD for the `dips` table.

use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, OptionalExtension, Row};

use super::{dublin_core_repo, Database, DatabaseError};
use crate::models::{Dip, ImportStatus, NewDip};

impl ToSql for ImportStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ImportStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

fn from_row(row: &Row<'_>) -> Result<Dip, rusqlite::Error> {
    Ok(Dip {
        id: row.get("id")?,
        objectszip: row.get("objectszip")?,
        uploaded: row.get("uploaded")?,
        collection_id: row.get("collection_id")?,
        dc_id: row.get("dc_id")?,
        import_task_id: row.get("import_task_id")?,
        import_status: row.get("import_status")?,
    })
}

/// Inserts the DIP and its Dublin Core record in one transaction.
pub fn insert(db: &Database, new: &NewDip) -> Result<Dip, DatabaseError> {
    let uploaded = Utc::now();
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        let dc_id = dublin_core_repo::insert_in(&tx, &new.dc)?;
        tx.execute(
            "INSERT INTO dips (objectszip, uploaded, collection_id, dc_id, import_task_id,
             import_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new.objectszip,
                uploaded,
                new.collection_id,
                dc_id,
                new.import_task_id,
                new.import_status,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Dip {
            id,
            objectszip: new.objectszip.clone(),
            uploaded,
            collection_id: new.collection_id,
            dc_id: Some(dc_id),
            import_task_id: new.import_task_id.clone(),
            import_status: new.import_status,
        })
    })
}

/// Overwrites every mutable column. `uploaded` is never changed.
pub fn update(db: &Database, dip: &Dip) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE dips SET objectszip=?2, collection_id=?3, dc_id=?4, import_task_id=?5,
             import_status=?6
             WHERE id=?1",
            params![
                dip.id,
                dip.objectszip,
                dip.collection_id,
                dip.dc_id,
                dip.import_task_id,
                dip.import_status,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Dip>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row("SELECT * FROM dips WHERE id = ?1", params![id], from_row)
            .optional()?)
    })
}

pub fn find_by_import_task_id(db: &Database, task_id: &str) -> Result<Option<Dip>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM dips WHERE import_task_id = ?1",
                params![task_id],
                from_row,
            )
            .optional()?)
    })
}

pub fn list_by_collection(db: &Database, collection_id: i64) -> Result<Vec<Dip>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM dips WHERE collection_id = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map(params![collection_id], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn list_all(db: &Database) -> Result<Vec<Dip>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM dips ORDER BY id")?;
        let rows = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Deletes a DIP, its files and events (via cascade), and its Dublin Core
/// record.
pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        let dc_id: Option<i64> = tx
            .query_row("SELECT dc_id FROM dips WHERE id = ?1", params![id], |r| {
                r.get::<_, Option<i64>>(0)
            })
            .optional()?
            .flatten();

        tx.execute("DELETE FROM dips WHERE id = ?1", params![id])?;
        if let Some(dc_id) = dc_id {
            dublin_core_repo::delete_in(&tx, dc_id)?;
        }

        tx.commit()?;
        Ok(())
    })
}

pub fn count_files(db: &Database, id: i64) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM digital_files WHERE dip_id = ?1",
            params![id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

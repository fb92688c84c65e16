//! Collection repository: CRUD for the `collections` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{dublin_core_repo, Database, DatabaseError};
use crate::models::{Collection, NewCollection};

fn from_row(row: &Row<'_>) -> Result<Collection, rusqlite::Error> {
    Ok(Collection {
        id: row.get("id")?,
        link: row.get("link")?,
        dc_id: row.get("dc_id")?,
    })
}

/// Inserts the collection and its Dublin Core record in one transaction.
pub fn insert(db: &Database, new: &NewCollection) -> Result<Collection, DatabaseError> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        let dc_id = dublin_core_repo::insert_in(&tx, &new.dc)?;
        tx.execute(
            "INSERT INTO collections (link, dc_id) VALUES (?1, ?2)",
            params![new.link, dc_id],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Collection {
            id,
            link: new.link.clone(),
            dc_id: Some(dc_id),
        })
    })
}

pub fn update(db: &Database, collection: &Collection) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE collections SET link=?2, dc_id=?3 WHERE id=?1",
            params![collection.id, collection.link, collection.dc_id],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Collection>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM collections WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?)
    })
}

pub fn list_all(db: &Database) -> Result<Vec<Collection>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM collections ORDER BY id")?;
        let rows = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Deletes a collection, its DIPs and files (via cascade), and every
/// Dublin Core record they owned.
pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;

        let dc_ids = {
            let mut stmt = tx.prepare(
                "SELECT dc_id FROM collections WHERE id = ?1 AND dc_id IS NOT NULL
                 UNION ALL
                 SELECT dc_id FROM dips WHERE collection_id = ?1 AND dc_id IS NOT NULL",
            )?;
            let ids = stmt
                .query_map(params![id], |r| r.get::<_, i64>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };

        tx.execute("DELETE FROM collections WHERE id = ?1", params![id])?;
        for dc_id in dc_ids {
            dublin_core_repo::delete_in(&tx, dc_id)?;
        }

        tx.commit()?;
        Ok(())
    })
}

pub fn count_dips(db: &Database, id: i64) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM dips WHERE collection_id = ?1",
            params![id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

pub fn count_files(db: &Database, id: i64) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM digital_files f JOIN dips d ON f.dip_id = d.id
             WHERE d.collection_id = ?1",
            params![id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

//! Dublin Core repository: CRUD for the `dublin_core` table.
//!
//! The `*_in` variants take a bare connection so that other repositories
//! can call them inside their own transactions.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::models::DublinCore;

pub(crate) fn from_row(row: &Row<'_>) -> Result<DublinCore, rusqlite::Error> {
    Ok(DublinCore {
        id: row.get("id")?,
        identifier: row.get("identifier")?,
        title: row.get("title")?,
        creator: row.get("creator")?,
        subject: row.get("subject")?,
        description: row.get("description")?,
        publisher: row.get("publisher")?,
        contributor: row.get("contributor")?,
        date: row.get("date")?,
        dc_type: row.get("type")?,
        format: row.get("format")?,
        source: row.get("source")?,
        language: row.get("language")?,
        coverage: row.get("coverage")?,
        rights: row.get("rights")?,
    })
}

pub(crate) fn insert_in(conn: &Connection, dc: &DublinCore) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO dublin_core (identifier, title, creator, subject, description, publisher,
         contributor, date, type, format, source, language, coverage, rights)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            dc.identifier,
            dc.title,
            dc.creator,
            dc.subject,
            dc.description,
            dc.publisher,
            dc.contributor,
            dc.date,
            dc.dc_type,
            dc.format,
            dc.source,
            dc.language,
            dc.coverage,
            dc.rights,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn delete_in(conn: &Connection, id: i64) -> Result<(), rusqlite::Error> {
    conn.execute("DELETE FROM dublin_core WHERE id = ?1", params![id])?;
    Ok(())
}

/// Inserts a record and returns its new id. `dc.id` is ignored.
pub fn insert(db: &Database, dc: &DublinCore) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| Ok(insert_in(conn, dc)?))
}

/// Overwrites every field of an existing record.
pub fn update(db: &Database, dc: &DublinCore) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE dublin_core SET identifier=?2, title=?3, creator=?4, subject=?5,
             description=?6, publisher=?7, contributor=?8, date=?9, type=?10, format=?11,
             source=?12, language=?13, coverage=?14, rights=?15
             WHERE id=?1",
            params![
                dc.id,
                dc.identifier,
                dc.title,
                dc.creator,
                dc.subject,
                dc.description,
                dc.publisher,
                dc.contributor,
                dc.date,
                dc.dc_type,
                dc.format,
                dc.source,
                dc.language,
                dc.coverage,
                dc.rights,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<DublinCore>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM dublin_core WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?)
    })
}

pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| Ok(delete_in(conn, id)?))
}

/// Counts records carrying the given identifier.
pub fn count_by_identifier(db: &Database, identifier: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM dublin_core WHERE identifier = ?1",
            params![identifier],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_find_update_delete() {
        let db = Database::open_in_memory().unwrap();
        let mut dc = DublinCore::new("AIP-1");
        dc.dc_type = "Text".into();

        let id = insert(&db, &dc).unwrap();
        let mut found = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.dc_type, "Text");

        found.title = "Minutes".into();
        update(&db, &found).unwrap();
        assert_eq!(find_by_id(&db, id).unwrap().unwrap().title, "Minutes");
        assert_eq!(count_by_identifier(&db, "AIP-1").unwrap(), 1);

        delete(&db, id).unwrap();
        assert!(find_by_id(&db, id).unwrap().is_none());
        assert_eq!(count_by_identifier(&db, "AIP-1").unwrap(), 0);
    }
}

//! Digital file repository: CRUD for the `digital_files` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::models::DigitalFile;

fn from_row(row: &Row<'_>) -> Result<DigitalFile, rusqlite::Error> {
    Ok(DigitalFile {
        uuid: row.get("uuid")?,
        filepath: row.get("filepath")?,
        fileformat: row.get("fileformat")?,
        formatversion: row.get("formatversion")?,
        size_bytes: row.get("size_bytes")?,
        size_human: row.get("size_human")?,
        datemodified: row.get("datemodified")?,
        puid: row.get("puid")?,
        amdsec: row.get("amdsec")?,
        hashtype: row.get("hashtype")?,
        hashvalue: row.get("hashvalue")?,
        dip_id: row.get("dip_id")?,
    })
}

pub fn insert(db: &Database, file: &DigitalFile) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO digital_files (uuid, filepath, fileformat, formatversion, size_bytes,
             size_human, datemodified, puid, amdsec, hashtype, hashvalue, dip_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                file.uuid,
                file.filepath,
                file.fileformat,
                file.formatversion,
                file.size_bytes,
                file.size_human,
                file.datemodified,
                file.puid,
                file.amdsec,
                file.hashtype,
                file.hashvalue,
                file.dip_id,
            ],
        )?;
        Ok(())
    })
}

/// Overwrites every column except the primary key.
pub fn update(db: &Database, file: &DigitalFile) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE digital_files SET filepath=?2, fileformat=?3, formatversion=?4,
             size_bytes=?5, size_human=?6, datemodified=?7, puid=?8, amdsec=?9, hashtype=?10,
             hashvalue=?11, dip_id=?12
             WHERE uuid=?1",
            params![
                file.uuid,
                file.filepath,
                file.fileformat,
                file.formatversion,
                file.size_bytes,
                file.size_human,
                file.datemodified,
                file.puid,
                file.amdsec,
                file.hashtype,
                file.hashvalue,
                file.dip_id,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_uuid(db: &Database, uuid: &str) -> Result<Option<DigitalFile>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM digital_files WHERE uuid = ?1",
                params![uuid],
                from_row,
            )
            .optional()?)
    })
}

pub fn list_by_dip(db: &Database, dip_id: i64) -> Result<Vec<DigitalFile>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM digital_files WHERE dip_id = ?1 ORDER BY filepath")?;
        let rows = stmt
            .query_map(params![dip_id], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn list_by_collection(
    db: &Database,
    collection_id: i64,
) -> Result<Vec<DigitalFile>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT f.* FROM digital_files f JOIN dips d ON f.dip_id = d.id
             WHERE d.collection_id = ?1 ORDER BY f.dip_id, f.filepath",
        )?;
        let rows = stmt
            .query_map(params![collection_id], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn list_all(db: &Database) -> Result<Vec<DigitalFile>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM digital_files ORDER BY dip_id, filepath")?;
        let rows = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Deletes a file and its events (via cascade).
pub fn delete(db: &Database, uuid: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM digital_files WHERE uuid = ?1", params![uuid])?;
        Ok(())
    })
}

pub fn count_by_dip(db: &Database, dip_id: i64) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM digital_files WHERE dip_id = ?1",
            params![dip_id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

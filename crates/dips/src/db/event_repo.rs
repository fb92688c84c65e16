//! PREMIS event repository: CRUD for the `premis_events` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::models::PremisEvent;

fn from_row(row: &Row<'_>) -> Result<PremisEvent, rusqlite::Error> {
    Ok(PremisEvent {
        uuid: row.get("uuid")?,
        eventtype: row.get("eventtype")?,
        datetime: row.get("datetime")?,
        detail: row.get("detail")?,
        outcome: row.get("outcome")?,
        detailnote: row.get("detailnote")?,
        digitalfile_uuid: row.get("digitalfile_uuid")?,
    })
}

pub fn insert(db: &Database, event: &PremisEvent) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO premis_events (uuid, eventtype, datetime, detail, outcome, detailnote,
             digitalfile_uuid)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.uuid,
                event.eventtype,
                event.datetime,
                event.detail,
                event.outcome,
                event.detailnote,
                event.digitalfile_uuid,
            ],
        )?;
        Ok(())
    })
}

pub fn update(db: &Database, event: &PremisEvent) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE premis_events SET eventtype=?2, datetime=?3, detail=?4, outcome=?5,
             detailnote=?6, digitalfile_uuid=?7
             WHERE uuid=?1",
            params![
                event.uuid,
                event.eventtype,
                event.datetime,
                event.detail,
                event.outcome,
                event.detailnote,
                event.digitalfile_uuid,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_uuid(db: &Database, uuid: &str) -> Result<Option<PremisEvent>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM premis_events WHERE uuid = ?1",
                params![uuid],
                from_row,
            )
            .optional()?)
    })
}

/// Events of a file, oldest first.
pub fn list_by_file(db: &Database, file_uuid: &str) -> Result<Vec<PremisEvent>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM premis_events WHERE digitalfile_uuid = ?1 ORDER BY datetime, uuid",
        )?;
        let rows = stmt
            .query_map(params![file_uuid], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

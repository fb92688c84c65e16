//! Task result repository: outcome of background jobs, keyed by job id.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};

pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_FAILURE: &str = "FAILURE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResultRow {
    pub task_id: String,
    pub task_name: String,
    pub status: String,
    pub traceback: Option<String>,
    pub date_done: DateTime<Utc>,
}

impl TaskResultRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            task_id: row.get("task_id")?,
            task_name: row.get("task_name")?,
            status: row.get("status")?,
            traceback: row.get("traceback")?,
            date_done: row.get("date_done")?,
        })
    }
}

/// Records a task outcome, replacing any earlier one for the same id.
pub fn upsert(db: &Database, result: &TaskResultRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO task_results (task_id, task_name, status, traceback, date_done)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(task_id) DO UPDATE SET task_name=excluded.task_name,
             status=excluded.status, traceback=excluded.traceback,
             date_done=excluded.date_done",
            params![
                result.task_id,
                result.task_name,
                result.status,
                result.traceback,
                result.date_done,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_task_id(db: &Database, task_id: &str) -> Result<Option<TaskResultRow>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM task_results WHERE task_id = ?1",
                params![task_id],
                TaskResultRow::from_row,
            )
            .optional()?)
    })
}

//! Settings repository: named JSON values in the `settings` table.

use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Database, DatabaseError};

/// Returns the raw JSON value stored under `name`.
pub fn get_value(db: &Database, name: &str) -> Result<Option<Value>, DatabaseError> {
    let raw: Option<String> = db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT value FROM settings WHERE name = ?1",
                params![name],
                |r| r.get(0),
            )
            .optional()?)
    })?;

    raw.map(|raw| {
        serde_json::from_str(&raw).map_err(|e| DatabaseError::SettingJson {
            name: name.to_string(),
            source: e,
        })
    })
    .transpose()
}

/// Returns the setting decoded into `T`.
pub fn get<T: DeserializeOwned>(db: &Database, name: &str) -> Result<Option<T>, DatabaseError> {
    match get_value(db, name)? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| DatabaseError::SettingJson {
                name: name.to_string(),
                source: e,
            }),
        None => Ok(None),
    }
}

/// Creates or replaces the setting.
pub fn set(db: &Database, name: &str, value: &Value) -> Result<(), DatabaseError> {
    let raw = serde_json::to_string(value).map_err(|e| DatabaseError::SettingJson {
        name: name.to_string(),
        source: e,
    })?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO settings (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            params![name, raw],
        )?;
        Ok(())
    })
}

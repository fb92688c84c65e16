use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::{lookup, Document, IndexError, Refresh, SearchIndex};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    index_name TEXT NOT NULL,
    id TEXT NOT NULL,
    source TEXT NOT NULL,
    PRIMARY KEY (index_name, id)
);";

/// A persistent document index stored in its own SQLite file.
///
/// Every write is committed immediately, so the refresh flag has no
/// effect and `refresh` is a no-op.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| IndexError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        log::info!("Search index opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, IndexError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, IndexError>
    where
        F: FnOnce(&Connection) -> Result<T, IndexError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        f(&conn)
    }
}

impl SearchIndex for SqliteIndex {
    fn upsert(&self, document: &Document, _refresh: Refresh) -> Result<(), IndexError> {
        let source = serde_json::to_string(&document.source)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (index_name, id, source) VALUES (?1, ?2, ?3)
                 ON CONFLICT(index_name, id) DO UPDATE SET source = excluded.source",
                params![document.index, document.id, source],
            )?;
            Ok(())
        })
    }

    fn delete(&self, index: &str, id: &str, _refresh: Refresh) -> Result<bool, IndexError> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM documents WHERE index_name = ?1 AND id = ?2",
                params![index, id],
            )?;
            Ok(removed > 0)
        })
    }

    fn delete_by_term(
        &self,
        index: &str,
        field: &str,
        value: &Value,
    ) -> Result<u64, IndexError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let matching = {
                let mut stmt =
                    tx.prepare("SELECT id, source FROM documents WHERE index_name = ?1")?;
                let rows = stmt
                    .query_map(params![index], |r| {
                        Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                let mut matching = Vec::new();
                for (id, source) in rows {
                    let source: Value = serde_json::from_str(&source)?;
                    if lookup(&source, field) == Some(value) {
                        matching.push(id);
                    }
                }
                matching
            };

            for id in &matching {
                tx.execute(
                    "DELETE FROM documents WHERE index_name = ?1 AND id = ?2",
                    params![index, id],
                )?;
            }
            tx.commit()?;
            Ok(matching.len() as u64)
        })
    }

    fn get(&self, index: &str, id: &str) -> Result<Option<Value>, IndexError> {
        let source: Option<String> = self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT source FROM documents WHERE index_name = ?1 AND id = ?2",
                    params![index, id],
                    |r| r.get(0),
                )
                .optional()?)
        })?;
        Ok(source
            .map(|s| serde_json::from_str::<Value>(&s))
            .transpose()?)
    }

    fn count(&self, index: &str) -> Result<u64, IndexError> {
        self.with_conn(|conn| {
            let count: u64 = conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE index_name = ?1",
                params![index],
                |r| r.get(0),
            )?;
            Ok(count)
        })
    }

    fn refresh(&self) -> Result<(), IndexError> {
        Ok(())
    }
}

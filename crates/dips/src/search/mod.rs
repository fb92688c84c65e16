//! Search index abstraction.
//!
//! Documents are JSON objects addressed by `(index, id)`. Writes take a
//! [`Refresh`] flag: `Immediate` writes are visible to the next read,
//! `Deferred` ones only after [`SearchIndex::refresh`].

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

mod error;
mod memory;
mod sqlite;

pub use error::IndexError;
pub use memory::InMemoryIndex;
pub use sqlite::SqliteIndex;

pub const COLLECTIONS_INDEX: &str = "collections";
pub const DIPS_INDEX: &str = "dips";
pub const DIGITAL_FILES_INDEX: &str = "digital_files";

/// A projected document ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub index: &'static str,
    pub id: String,
    pub source: Value,
}

/// Visibility of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Immediate,
    Deferred,
}

pub trait SearchIndex: Send + Sync {
    /// Creates or replaces a document.
    fn upsert(&self, document: &Document, refresh: Refresh) -> Result<(), IndexError>;

    /// Deletes a document. Returns `false` when it did not exist.
    fn delete(&self, index: &str, id: &str, refresh: Refresh) -> Result<bool, IndexError>;

    /// Deletes every document of `index` whose dotted `field` equals
    /// `value`, returning how many were removed.
    fn delete_by_term(&self, index: &str, field: &str, value: &Value)
        -> Result<u64, IndexError>;

    /// Returns a visible document.
    fn get(&self, index: &str, id: &str) -> Result<Option<Value>, IndexError>;

    /// Number of visible documents in `index`.
    fn count(&self, index: &str) -> Result<u64, IndexError>;

    /// Makes every deferred write visible.
    fn refresh(&self) -> Result<(), IndexError>;
}

/// Looks up a dotted path such as `collection.id` inside a document.
pub fn lookup<'a>(source: &'a Value, field: &str) -> Option<&'a Value> {
    field
        .split('.')
        .try_fold(source, |value, key| value.as_object()?.get(key))
}

/// Default location of the persistent index, next to the database.
pub fn default_index_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".dips").join("data").join("index.db"))
}

/// Selects and builds a search index backend.
///
/// `Memory` keeps documents for the life of the process only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum IndexConfig {
    Memory,
    Sqlite {
        path: PathBuf,
    },
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig::Sqlite {
            path: default_index_path().unwrap_or_else(|| PathBuf::from("index.db")),
        }
    }
}

impl IndexConfig {
    pub fn build(&self) -> Result<Arc<dyn SearchIndex>, IndexError> {
        match self {
            IndexConfig::Memory => Ok(Arc::new(InMemoryIndex::new())),
            IndexConfig::Sqlite { path } => Ok(Arc::new(SqliteIndex::open(path)?)),
        }
    }
}

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

use super::{lookup, Document, IndexError, Refresh, SearchIndex};

type Key = (String, String);

enum PendingOp {
    Upsert(Key, Value),
    Delete(Key),
}

#[derive(Default)]
struct State {
    visible: HashMap<Key, Value>,
    pending: Vec<PendingOp>,
}

impl State {
    fn apply_pending(&mut self) {
        for op in self.pending.drain(..) {
            match op {
                PendingOp::Upsert(key, value) => {
                    self.visible.insert(key, value);
                }
                PendingOp::Delete(key) => {
                    self.visible.remove(&key);
                }
            }
        }
    }
}

/// An in-memory index with an explicit refresh buffer.
///
/// Deferred writes are queued and only become visible on the next
/// immediate write or [`SearchIndex::refresh`].
#[derive(Default)]
pub struct InMemoryIndex {
    state: RwLock<State>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes waiting for a refresh.
    pub fn pending(&self) -> Result<usize, IndexError> {
        Ok(self
            .state
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .pending
            .len())
    }

    /// Visible ids of `index`, sorted.
    pub fn ids(&self, index: &str) -> Result<Vec<String>, IndexError> {
        let guard = self
            .state
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        let mut ids: Vec<String> = guard
            .visible
            .keys()
            .filter(|(i, _)| i == index)
            .map(|(_, id)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

impl SearchIndex for InMemoryIndex {
    fn upsert(&self, document: &Document, refresh: Refresh) -> Result<(), IndexError> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        let key = (document.index.to_string(), document.id.clone());
        guard
            .pending
            .push(PendingOp::Upsert(key, document.source.clone()));
        if refresh == Refresh::Immediate {
            guard.apply_pending();
        }
        Ok(())
    }

    fn delete(&self, index: &str, id: &str, refresh: Refresh) -> Result<bool, IndexError> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        let key = (index.to_string(), id.to_string());
        let existed = guard.visible.contains_key(&key)
            || guard.pending.iter().any(|op| match op {
                PendingOp::Upsert(k, _) => *k == key,
                PendingOp::Delete(_) => false,
            });
        guard.pending.push(PendingOp::Delete(key));
        if refresh == Refresh::Immediate {
            guard.apply_pending();
        }
        Ok(existed)
    }

    fn delete_by_term(
        &self,
        index: &str,
        field: &str,
        value: &Value,
    ) -> Result<u64, IndexError> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        guard.apply_pending();
        let before = guard.visible.len();
        guard
            .visible
            .retain(|(i, _), source| !(i == index && lookup(source, field) == Some(value)));
        Ok((before - guard.visible.len()) as u64)
    }

    fn get(&self, index: &str, id: &str) -> Result<Option<Value>, IndexError> {
        let guard = self
            .state
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        Ok(guard
            .visible
            .get(&(index.to_string(), id.to_string()))
            .cloned())
    }

    fn count(&self, index: &str) -> Result<u64, IndexError> {
        let guard = self
            .state
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        Ok(guard.visible.keys().filter(|(i, _)| i == index).count() as u64)
    }

    fn refresh(&self) -> Result<(), IndexError> {
        self.state
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .apply_pending();
        Ok(())
    }
}

//! In-memory world state.
//!
//! Thread-safe `BTreeMap` backed store. Intended for embedded usage, tests,
//! and as the reference implementation of [`WorldState`].

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use crate::storage::traits::{in_range, StateEntry, StorageError, WorldState};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Backend(format!("poisoned lock: {context}"))
}

/// Thread-safe in-memory world state.
#[derive(Debug, Default)]
pub struct InMemoryWorldState {
    state: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryWorldState {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with raw entries.
    ///
    /// Values are stored as given, without validation.
    #[must_use]
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<u8>)>,
        K: Into<String>,
    {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            state: RwLock::new(map),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.state.read().map_err(|_| lock_err("state.len"))?.len())
    }

    /// Returns true if no keys are stored.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl WorldState for InMemoryWorldState {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("state.get"))?;
        Ok(state.get(key).cloned())
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("state.put"))?;
        state.insert(key.to_string(), value);
        Ok(())
    }

    fn del_state(&self, key: &str) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("state.del"))?;
        state.remove(key);
        Ok(())
    }

    fn get_state_by_range(&self, start: &str, end: &str) -> Result<Vec<StateEntry>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("state.range"))?;
        let lower = if start.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start)
        };
        Ok(state
            .range::<str, _>((lower, Bound::Unbounded))
            .take_while(|(k, _)| in_range(k, start, end))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

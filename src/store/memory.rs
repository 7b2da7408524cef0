//! In-memory backing store
//!
//! Keeps one versioned value per key and records the keys of every batch
//! it serves, so callers can observe how many round trips were made and
//! which keys were written.

use std::collections::HashMap;

use super::errors::{StoreError, StoreResult};
use super::BackingStore;
use crate::state::{Key, VersionedValue};

/// Typed in-memory store.
#[derive(Debug, Clone)]
pub struct MemoryStore<T> {
    values: HashMap<Key, VersionedValue<T>>,
    get_batches: Vec<Vec<Key>>,
    put_batches: Vec<Vec<Key>>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            get_batches: Vec::new(),
            put_batches: Vec::new(),
        }
    }
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing values.
    pub fn with_values(values: impl IntoIterator<Item = (Key, VersionedValue<T>)>) -> Self {
        Self {
            values: values.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Current value of `key`, bypassing batch recording.
    pub fn get(&self, key: &Key) -> Option<&VersionedValue<T>> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys of every `multi_get` served, oldest first.
    pub fn get_batches(&self) -> &[Vec<Key>] {
        &self.get_batches
    }

    /// Keys of every `multi_put` applied, oldest first.
    pub fn put_batches(&self) -> &[Vec<Key>] {
        &self.put_batches
    }

    /// Forget recorded batches; stored values are kept.
    pub fn clear_history(&mut self) {
        self.get_batches.clear();
        self.put_batches.clear();
    }
}

impl<T: Clone> BackingStore<T> for MemoryStore<T> {
    fn multi_get(&mut self, keys: &[Key]) -> StoreResult<Vec<Option<VersionedValue<T>>>> {
        self.get_batches.push(keys.to_vec());
        Ok(keys.iter().map(|key| self.values.get(key).cloned()).collect())
    }

    fn multi_put(&mut self, keys: &[Key], values: &[VersionedValue<T>]) -> StoreResult<()> {
        StoreError::check_batch(keys.len(), values.len())?;
        self.put_batches.push(keys.to_vec());
        for (key, value) in keys.iter().zip(values) {
            self.values.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

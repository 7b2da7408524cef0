//! Write-memoizing batch cache
//!
//! - Values written during an attempt are remembered until `reset`
//! - Reads of remembered keys are answered from memory as `Cached`
//! - All other keys go to the backing store in one batch, as `Fresh`
//! - Reads themselves are never remembered
//!
//! Keeping reads out of the memo means a `Fresh` answer always reflects the
//! store as of this call.

use std::collections::HashMap;

use super::{BatchCache, CachedRead};
use crate::state::{Key, VersionedValue};
use crate::store::{BackingStore, StoreError, StoreResult};

/// Cache statistics, passive only.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Keys answered from the memo
    pub hits: u64,
    /// Keys sent to the backing store
    pub misses: u64,
    /// `multi_get` calls made on the backing store
    pub store_reads: u64,
    /// `multi_put` calls made on the backing store
    pub store_writes: u64,
}

/// Batch cache over a [`BackingStore`].
#[derive(Debug)]
pub struct CachedBatchReads<T, S> {
    store: S,
    memo: HashMap<Key, VersionedValue<T>>,
    stats: CacheStats,
}

impl<T, S> CachedBatchReads<T, S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            memo: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Number of keys remembered for the current attempt.
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl<T, S> BatchCache<T> for CachedBatchReads<T, S>
where
    T: Clone,
    S: BackingStore<T>,
{
    fn batched_read(&mut self, keys: &[Key]) -> StoreResult<Vec<CachedRead<T>>> {
        // Distinct keys the memo cannot answer, in first-seen order.
        let mut missing: Vec<Key> = Vec::new();
        let mut slot: HashMap<&Key, usize> = HashMap::new();
        for key in keys {
            if !self.memo.contains_key(key) && !slot.contains_key(key) {
                slot.insert(key, missing.len());
                missing.push(key.clone());
            }
        }

        let fetched = if missing.is_empty() {
            Vec::new()
        } else {
            self.stats.store_reads += 1;
            let fetched = self.store.multi_get(&missing)?;
            StoreError::check_batch(missing.len(), fetched.len())?;
            fetched
        };

        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            match self.memo.get(key) {
                Some(value) => {
                    self.stats.hits += 1;
                    results.push(CachedRead::cached(value.clone()));
                }
                None => {
                    self.stats.misses += 1;
                    let value = slot.get(key).and_then(|&i| fetched[i].clone());
                    results.push(CachedRead::fresh(value));
                }
            }
        }
        Ok(results)
    }

    fn batched_write(&mut self, keys: &[Key], values: Vec<VersionedValue<T>>) -> StoreResult<()> {
        StoreError::check_batch(keys.len(), values.len())?;
        if keys.is_empty() {
            return Ok(());
        }

        self.stats.store_writes += 1;
        self.store.multi_put(keys, &values)?;

        for (key, value) in keys.iter().zip(values) {
            self.memo.insert(key.clone(), value);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.memo.clear();
    }
}

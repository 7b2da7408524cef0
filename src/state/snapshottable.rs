//! Single-value state on top of a map
//!
//! Global aggregates (a running total, a high-water mark) are one value per
//! partition. They are stored under one fixed key of an ordinary map, so
//! they get the same replay guarantees as keyed state.

use std::marker::PhantomData;
use std::slice;

use super::errors::StateResult;
use super::traits::{MapState, State};
use super::{Key, TxId, ValueUpdater};
use crate::store::StoreError;

/// Key under which the single value is stored.
pub const GLOBAL_KEY: &str = "$GLOBAL$";

/// One value held under a fixed key of a [`MapState`].
pub struct SnapshottableMap<T, M> {
    delegate: M,
    key: Key,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T, M> SnapshottableMap<T, M> {
    /// Store the value under [`GLOBAL_KEY`].
    pub fn new(delegate: M) -> Self {
        Self::with_key(delegate, Key::from(GLOBAL_KEY))
    }

    pub fn with_key(delegate: M, key: Key) -> Self {
        Self {
            delegate,
            key,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn delegate(&self) -> &M {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut M {
        &mut self.delegate
    }

    pub fn into_inner(self) -> M {
        self.delegate
    }
}

impl<T, M: MapState<T>> SnapshottableMap<T, M> {
    pub fn get(&mut self) -> StateResult<Option<T>> {
        let mut values = self.delegate.multi_get(slice::from_ref(&self.key))?;
        Ok(values.pop().flatten())
    }

    pub fn set(&mut self, value: T) -> StateResult<()> {
        self.delegate.multi_put(slice::from_ref(&self.key), vec![value])
    }

    /// Apply `updater` once per transaction; returns the resulting value.
    pub fn update<U: ValueUpdater<T>>(&mut self, updater: U) -> StateResult<T> {
        let mut values = self
            .delegate
            .multi_update(slice::from_ref(&self.key), slice::from_ref(&updater))?;
        let count = values.len();
        match values.pop() {
            Some(value) if count == 1 => Ok(value),
            _ => Err(StoreError::BatchMismatch {
                keys: 1,
                values: count,
            }
            .into()),
        }
    }
}

impl<T, M: State> State for SnapshottableMap<T, M> {
    fn begin_commit(&mut self, txid: TxId) -> StateResult<()> {
        self.delegate.begin_commit(txid)
    }

    fn commit(&mut self, txid: TxId) {
        self.delegate.commit(txid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CachedBatchReads;
    use crate::state::{CombinerUpdater, Sum, TransactionalMap, VersionedValue};
    use crate::store::MemoryStore;

    type Counter = SnapshottableMap<
        u64,
        TransactionalMap<u64, CachedBatchReads<u64, MemoryStore<u64>>>,
    >;

    fn counter() -> Counter {
        SnapshottableMap::new(TransactionalMap::build(MemoryStore::new()))
    }

    #[test]
    fn test_get_set() {
        let mut total = counter();
        total.begin_commit(TxId::new(1)).unwrap();
        assert_eq!(total.get().unwrap(), None);

        total.set(9).unwrap();
        assert_eq!(total.get().unwrap(), Some(9));
        total.commit(TxId::new(1));

        let stored = total.delegate().cache().store().get(&Key::from(GLOBAL_KEY));
        assert_eq!(stored, Some(&VersionedValue::new(TxId::new(1), 9)));
    }

    #[test]
    fn test_update_once_per_transaction() {
        let mut total = counter();
        total.begin_commit(TxId::new(1)).unwrap();
        assert_eq!(total.update(CombinerUpdater::new(Sum, 5u64)).unwrap(), 5);
        total.commit(TxId::new(1));

        // Replay of txid 2 after its write landed but before commit.
        total.begin_commit(TxId::new(2)).unwrap();
        assert_eq!(total.update(CombinerUpdater::new(Sum, 3u64)).unwrap(), 8);
        total.begin_commit(TxId::new(2)).unwrap();
        assert_eq!(total.update(CombinerUpdater::new(Sum, 3u64)).unwrap(), 8);
        total.commit(TxId::new(2));
    }

    #[test]
    fn test_custom_key() {
        let mut total: Counter = SnapshottableMap::with_key(
            TransactionalMap::build(MemoryStore::new()),
            Key::from("high-water"),
        );
        total.begin_commit(TxId::new(1)).unwrap();
        total.set(1).unwrap();
        assert_eq!(total.key(), &Key::from("high-water"));
        assert_eq!(total.delegate().cache().store().len(), 1);
    }
}

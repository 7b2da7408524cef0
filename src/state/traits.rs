//! Orchestrator-facing state contracts

use super::{Key, StateResult, TxId, ValueUpdater};

/// Transaction boundaries driven by the orchestrator.
pub trait State {
    /// Start (or restart, with the same txid) a transaction attempt.
    fn begin_commit(&mut self, txid: TxId) -> StateResult<()>;

    /// Finish the current attempt once its writes are durable.
    fn commit(&mut self, txid: TxId);
}

/// Batched key/value state that takes part in transactions.
pub trait MapState<T>: State {
    /// Current values, one per key, in input order.
    fn multi_get(&mut self, keys: &[Key]) -> StateResult<Vec<Option<T>>>;

    /// Apply `updaters[i]` to `keys[i]`; returns the next values in input order.
    fn multi_update<U: ValueUpdater<T>>(
        &mut self,
        keys: &[Key],
        updaters: &[U],
    ) -> StateResult<Vec<T>>;

    /// Overwrite `keys[i]` with `values[i]`.
    fn multi_put(&mut self, keys: &[Key], values: Vec<T>) -> StateResult<()>;
}

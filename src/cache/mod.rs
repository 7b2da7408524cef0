//! Batch cache between the state map and its backing store
//!
//! A batch cache lives for one transaction attempt:
//! - reads report whether they were served by the store or by the memo
//! - writes are remembered until `reset`
//! - `reset` runs at every attempt boundary (begin and commit)
//!
//! The state map only relies on the contract below; [`CachedBatchReads`]
//! is the implementation shipped with the crate.

mod batch_reads;

pub use batch_reads::{CacheStats, CachedBatchReads};

use crate::state::{Key, VersionedValue};
use crate::store::StoreResult;

/// Where a read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Read from the backing store in this call
    Fresh,
    /// Served from the memo of a write made earlier in this attempt
    Cached,
}

/// One entry of a batched read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRead<T> {
    pub value: Option<VersionedValue<T>>,
    pub provenance: Provenance,
}

impl<T> CachedRead<T> {
    pub fn fresh(value: Option<VersionedValue<T>>) -> Self {
        Self {
            value,
            provenance: Provenance::Fresh,
        }
    }

    pub fn cached(value: VersionedValue<T>) -> Self {
        Self {
            value: Some(value),
            provenance: Provenance::Cached,
        }
    }

    /// Returns true if the backing store confirmed this value.
    pub fn is_fresh(&self) -> bool {
        self.provenance == Provenance::Fresh
    }
}

/// Attempt-scoped view of a backing store.
pub trait BatchCache<T> {
    /// One result per key, in input order; duplicate keys allowed.
    fn batched_read(&mut self, keys: &[Key]) -> StoreResult<Vec<CachedRead<T>>>;

    /// Write `values[i]` under `keys[i]`. Both sequences have equal length.
    fn batched_write(&mut self, keys: &[Key], values: Vec<VersionedValue<T>>) -> StoreResult<()>;

    /// Discard everything remembered for the current attempt.
    fn reset(&mut self);
}

//! Backing stores for the transactional state map
//!
//! The state map never talks to a store directly: it goes through a
//! [`BatchCache`](crate::cache::BatchCache), which wraps one of the stores
//! defined here.
//!
//! # Contracts
//!
//! - [`BackingStore`]: typed, key to [`VersionedValue`] mapping
//! - [`ByteStore`]: untyped, key to bytes mapping
//!
//! Both are batched: one call covers many keys, results come back in input
//! order, duplicate keys are tolerated.
//!
//! # Implementations
//!
//! - [`MemoryStore`]: in-memory, records every batch it serves
//! - [`FileStore`]: append-only, checksummed, fsynced file (latest record wins)
//! - [`EncodedStore`]: tagged JSON envelope turning a `ByteStore` into a
//!   `BackingStore<T>`

mod checksum;
mod envelope;
mod errors;
mod file;
mod memory;
mod reader;
mod record;

pub use checksum::{compute_checksum, verify_checksum};
pub use envelope::{EncodedStore, Envelope};
pub use errors::{StoreError, StoreResult};
pub use file::{FileStore, ScanReport, STORE_DIR, STORE_FILE};
pub use memory::MemoryStore;
pub use reader::RecordReader;
pub use record::KeyRecord;

use crate::state::{Key, VersionedValue};

/// Durable mapping from key to versioned value.
pub trait BackingStore<T> {
    /// Fetch the current value of every key, in input order.
    fn multi_get(&mut self, keys: &[Key]) -> StoreResult<Vec<Option<VersionedValue<T>>>>;

    /// Store `values[i]` under `keys[i]`. Both slices have equal length.
    fn multi_put(&mut self, keys: &[Key], values: &[VersionedValue<T>]) -> StoreResult<()>;
}

/// Durable mapping from key to opaque bytes.
pub trait ByteStore {
    /// Fetch the current bytes of every key, in input order.
    fn multi_get(&mut self, keys: &[Key]) -> StoreResult<Vec<Option<Vec<u8>>>>;

    /// Store `values[i]` under `keys[i]`. Both slices have equal length.
    fn multi_put(&mut self, keys: &[Key], values: &[Vec<u8>]) -> StoreResult<()>;
}

impl<T, S: BackingStore<T> + ?Sized> BackingStore<T> for Box<S> {
    fn multi_get(&mut self, keys: &[Key]) -> StoreResult<Vec<Option<VersionedValue<T>>>> {
        (**self).multi_get(keys)
    }

    fn multi_put(&mut self, keys: &[Key], values: &[VersionedValue<T>]) -> StoreResult<()> {
        (**self).multi_put(keys, values)
    }
}

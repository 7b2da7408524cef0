//! txstate - exactly-once transactional state for batch stream processing
//!
//! A [`TransactionalMap`] stores every value together with the id of the
//! transaction that wrote it, so a transaction replayed after a failure
//! applies each update exactly once.

pub mod cache;
pub mod cli;
pub mod config;
pub mod observability;
pub mod state;
pub mod store;

pub use cache::{BatchCache, CachedBatchReads, CachedRead, Provenance};
pub use config::{ConfigError, StateConfig};
pub use state::{
    Key, MapState, SnapshottableMap, State, StateError, StateResult, TransactionalMap, TxId,
    ValueUpdater, VersionedValue,
};
pub use store::{BackingStore, ByteStore, EncodedStore, FileStore, MemoryStore, StoreError};

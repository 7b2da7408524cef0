//! Transactional state
//!
//! The orchestrator drives each partition's state through a fixed protocol:
//!
//! 1. `begin_commit(txid)`
//! 2. any number of `multi_get` / `multi_update` / `multi_put`
//! 3. `commit(txid)` once the writes are durable
//!
//! A failure anywhere before step 3 is followed by `begin_commit` with the
//! same txid and a replay of the whole attempt. [`TransactionalMap`] makes
//! that replay apply every update exactly once.

mod errors;
mod key;
mod snapshottable;
mod traits;
mod transactional_map;
mod txid;
mod updater;
mod value;

pub use errors::{StateError, StateResult};
pub use key::Key;
pub use snapshottable::{SnapshottableMap, GLOBAL_KEY};
pub use traits::{MapState, State};
pub use transactional_map::{DurableMap, TransactionalMap};
pub use txid::TxId;
pub use updater::{
    updater_fn, Combiner, CombinerUpdater, Count, FnUpdater, ReplaceUpdater, Sum, ValueUpdater,
};
pub use value::VersionedValue;

//! Transactional state map
//!
//! Exactly-once batched get/update/put over a backing store, correct under
//! transaction replay.
//!
//! Every value is stored together with the id of the transaction that
//! wrote it. When an attempt is replayed after a failure, an update is
//! skipped for a key whose stored value the store itself reports as
//! written by the current transaction. Values served from the cache memo
//! are tentative writes of this attempt and never justify a skip.
//!
//! Lifecycle: `Idle --begin_commit(T)--> Active(T) --commit(T)--> Idle`.
//! After a failure in `Active(T)` the only resumption is `begin_commit(T)`.

use std::marker::PhantomData;
use std::sync::Arc;

use super::errors::{StateError, StateResult};
use super::traits::{MapState, State};
use super::{Key, TxId, ValueUpdater, VersionedValue};
use crate::cache::{BatchCache, CachedBatchReads, CachedRead, Provenance};
use crate::config::{ConfigError, StateConfig};
use crate::observability::{Event, Logger, Severity, StateMetrics};
use crate::store::{BackingStore, EncodedStore, FileStore, StoreError};

/// Map over the durable file store, as built by [`TransactionalMap::open_durable`].
pub type DurableMap<T> = TransactionalMap<T, CachedBatchReads<T, EncodedStore<FileStore, T>>>;

/// Batched, replay-safe key/value state for one partition.
pub struct TransactionalMap<T, C> {
    cache: C,
    current_tx: Option<TxId>,
    partition: String,
    logger: Logger,
    metrics: Arc<StateMetrics>,
    _marker: PhantomData<fn(T) -> T>,
}

/// What the replay rule decided for one position of `multi_update`.
#[derive(Debug, PartialEq)]
enum Step<T> {
    /// Stored value already reflects this transaction
    Reuse(VersionedValue<T>),
    /// Updater was applied; the value must be written
    Apply(VersionedValue<T>),
}

fn next_version<T, U>(txid: TxId, read: CachedRead<T>, updater: &U) -> Step<T>
where
    U: ValueUpdater<T>,
{
    let CachedRead { value, provenance } = read;
    match value {
        None => Step::Apply(VersionedValue::new(txid, updater.update(None))),
        Some(existing) if existing.written_by(txid) && provenance == Provenance::Fresh => {
            Step::Reuse(existing)
        }
        Some(existing) => {
            let next = updater.update(Some(existing.value()));
            Step::Apply(VersionedValue::new(txid, next))
        }
    }
}

impl<T, S> TransactionalMap<T, CachedBatchReads<T, S>>
where
    T: Clone,
    S: BackingStore<T>,
{
    /// Build a map over `store` with the default write-memoizing cache.
    pub fn build(store: S) -> Self {
        Self::with_cache(CachedBatchReads::new(store))
    }
}

impl<T> DurableMap<T>
where
    T: Clone + serde::Serialize + serde::de::DeserializeOwned,
{
    /// Open a map persisted under `config.data_dir`.
    pub fn open_durable(config: &StateConfig) -> StateResult<Self> {
        config.validate()?;
        let data_dir = config.data_path().ok_or_else(|| {
            ConfigError::Invalid("data_dir is required to open a durable map".into())
        })?;
        let logger = config.logger()?;

        let files = FileStore::open_with(data_dir, config.sync_writes, logger.clone())?;
        let store = EncodedStore::new(files, config.value_tag.clone());

        Ok(Self::with_cache(CachedBatchReads::new(store))
            .with_logger(logger)
            .with_partition(config.partition_label()))
    }
}

impl<T, C> TransactionalMap<T, C> {
    /// Build a map over an arbitrary batch cache. Starts Idle, logging disabled.
    pub fn with_cache(cache: C) -> Self {
        Self {
            cache,
            current_tx: None,
            partition: uuid::Uuid::new_v4().to_string(),
            logger: Logger::disabled(),
            metrics: Arc::new(StateMetrics::new()),
            _marker: PhantomData,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Set the partition label carried by every log line.
    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    /// Share a metrics registry with other maps.
    pub fn with_metrics(mut self, metrics: Arc<StateMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Current Transaction, `None` while Idle.
    pub fn current_tx(&self) -> Option<TxId> {
        self.current_tx
    }

    pub fn is_active(&self) -> bool {
        self.current_tx.is_some()
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }

    pub fn metrics(&self) -> Arc<StateMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut C {
        &mut self.cache
    }

    pub fn into_cache(self) -> C {
        self.cache
    }

    fn reject(&self, operation: &'static str, err: StateError) -> StateError {
        self.metrics.increment_rejected();
        let code = err.code();
        let reason = err.to_string();
        let txid = tx_label(self.current_tx);
        self.logger.warn(
            Event::TxRejected,
            &[
                ("operation", operation),
                ("code", code),
                ("reason", reason.as_str()),
                ("partition", self.partition.as_str()),
                ("txid", txid.as_str()),
            ],
        );
        err
    }

    fn active_tx(&self, operation: &'static str) -> StateResult<TxId> {
        match self.current_tx {
            Some(txid) => Ok(txid),
            None => Err(self.reject(operation, StateError::NoActiveTransaction { operation })),
        }
    }

    fn check_lengths(
        &self,
        operation: &'static str,
        what: &'static str,
        keys: usize,
        values: usize,
    ) -> StateResult<()> {
        if keys == values {
            return Ok(());
        }
        Err(self.reject(
            operation,
            StateError::LengthMismatch {
                operation,
                what,
                keys,
                values,
            },
        ))
    }
}

impl<T, C> TransactionalMap<T, C>
where
    T: Clone,
    C: BatchCache<T>,
{
    /// Start an attempt for `txid`; repeating the active txid is a retry.
    ///
    /// Both paths reset the cache. A different txid while Active is refused
    /// and leaves the map untouched.
    pub fn begin_commit(&mut self, txid: TxId) -> StateResult<()> {
        let event = match self.current_tx {
            Some(active) if active == txid => {
                self.metrics.increment_retried();
                Event::TxRetry
            }
            Some(active) => {
                return Err(self.reject(
                    "begin_commit",
                    StateError::TransactionInProgress {
                        active,
                        requested: txid,
                    },
                ));
            }
            None => {
                self.metrics.increment_begun();
                Event::TxBegin
            }
        };

        self.current_tx = Some(txid);
        self.cache.reset();

        let txid = txid.to_string();
        self.logger.info(
            event,
            &[
                ("partition", self.partition.as_str()),
                ("txid", txid.as_str()),
            ],
        );
        Ok(())
    }

    /// End the current attempt. Always returns the map to Idle; only a
    /// commit of the active txid counts as a committed transaction.
    pub fn commit(&mut self, txid: TxId) {
        let requested = txid.to_string();
        let matched = self.current_tx == Some(txid);
        if !matched {
            let active = tx_label(self.current_tx);
            self.logger.warn(
                Event::TxCommitMismatch,
                &[
                    ("active", active.as_str()),
                    ("partition", self.partition.as_str()),
                    ("txid", requested.as_str()),
                ],
            );
        }

        self.current_tx = None;
        self.cache.reset();
        if matched {
            self.metrics.increment_committed();
        }
        self.logger.info(
            Event::TxCommit,
            &[
                ("partition", self.partition.as_str()),
                ("txid", requested.as_str()),
            ],
        );
    }

    /// Current values of `keys`, in input order.
    pub fn multi_get(&mut self, keys: &[Key]) -> StateResult<Vec<Option<T>>> {
        let txid = self.active_tx("multi_get")?;
        let reads = self.read_batch(keys)?;

        self.metrics.add_keys_read(keys.len() as u64);
        self.trace(Event::StateRead, txid, &[("keys", keys.len())]);

        Ok(reads
            .into_iter()
            .map(|read| read.value.map(VersionedValue::into_value))
            .collect())
    }

    /// Apply `updaters[i]` to `keys[i]` at most once per transaction.
    ///
    /// One batched read; one batched write holding only the positions whose
    /// updater ran. Returns every next value in input order.
    pub fn multi_update<U>(&mut self, keys: &[Key], updaters: &[U]) -> StateResult<Vec<T>>
    where
        U: ValueUpdater<T>,
    {
        self.check_lengths("multi_update", "updaters", keys.len(), updaters.len())?;
        let txid = self.active_tx("multi_update")?;
        let reads = self.read_batch(keys)?;

        let mut results = Vec::with_capacity(keys.len());
        let mut changed_keys = Vec::new();
        let mut changed_values = Vec::new();

        for ((key, read), updater) in keys.iter().zip(reads).zip(updaters) {
            match next_version(txid, read, updater) {
                Step::Reuse(existing) => results.push(existing.into_value()),
                Step::Apply(next) => {
                    results.push(next.value().clone());
                    changed_keys.push(key.clone());
                    changed_values.push(next);
                }
            }
        }

        let applied = changed_keys.len();
        let skipped = keys.len() - applied;
        if applied > 0 {
            self.cache.batched_write(&changed_keys, changed_values)?;
        }

        self.metrics.add_updates_applied(applied as u64);
        self.metrics.add_updates_skipped(skipped as u64);
        self.metrics.add_values_written(applied as u64);
        self.trace(
            Event::StateUpdate,
            txid,
            &[("applied", applied), ("keys", keys.len()), ("skipped", skipped)],
        );
        Ok(results)
    }

    /// Overwrite `keys[i]` with `values[i]` under the current transaction.
    pub fn multi_put(&mut self, keys: &[Key], values: Vec<T>) -> StateResult<()> {
        self.check_lengths("multi_put", "values", keys.len(), values.len())?;
        let txid = self.active_tx("multi_put")?;

        let count = values.len();
        let versioned = values
            .into_iter()
            .map(|value| VersionedValue::new(txid, value))
            .collect();
        self.cache.batched_write(keys, versioned)?;

        self.metrics.add_values_written(count as u64);
        self.trace(Event::StatePut, txid, &[("keys", count)]);
        Ok(())
    }

    fn read_batch(&mut self, keys: &[Key]) -> StateResult<Vec<CachedRead<T>>> {
        let reads = self.cache.batched_read(keys)?;
        StoreError::check_batch(keys.len(), reads.len())?;
        Ok(reads)
    }

    fn trace(&self, event: Event, txid: TxId, counts: &[(&'static str, usize)]) {
        if !self.logger.enabled(Severity::Trace) {
            return;
        }
        let txid = txid.to_string();
        let rendered: Vec<(&str, String)> = counts
            .iter()
            .map(|(name, count)| (*name, count.to_string()))
            .collect();

        let mut fields: Vec<(&str, &str)> = vec![
            ("partition", self.partition.as_str()),
            ("txid", txid.as_str()),
        ];
        fields.extend(rendered.iter().map(|(name, value)| (*name, value.as_str())));
        self.logger.trace(event, &fields);
    }
}

fn tx_label(txid: Option<TxId>) -> String {
    txid.map(|t| t.to_string())
        .unwrap_or_else(|| "none".to_string())
}

impl<T, C> State for TransactionalMap<T, C>
where
    T: Clone,
    C: BatchCache<T>,
{
    fn begin_commit(&mut self, txid: TxId) -> StateResult<()> {
        TransactionalMap::begin_commit(self, txid)
    }

    fn commit(&mut self, txid: TxId) {
        TransactionalMap::commit(self, txid)
    }
}

impl<T, C> MapState<T> for TransactionalMap<T, C>
where
    T: Clone,
    C: BatchCache<T>,
{
    fn multi_get(&mut self, keys: &[Key]) -> StateResult<Vec<Option<T>>> {
        TransactionalMap::multi_get(self, keys)
    }

    fn multi_update<U: ValueUpdater<T>>(
        &mut self,
        keys: &[Key],
        updaters: &[U],
    ) -> StateResult<Vec<T>> {
        TransactionalMap::multi_update(self, keys, updaters)
    }

    fn multi_put(&mut self, keys: &[Key], values: Vec<T>) -> StateResult<()> {
        TransactionalMap::multi_put(self, keys, values)
    }
}

//! Protocol counters for the transactional state map
//!
//! - Counters only, monotonic
//! - Passive: never consulted by protocol decisions
//! - Relaxed atomics so an orchestrator thread can read them

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters describing what the state map has done.
#[derive(Debug, Default)]
pub struct StateMetrics {
    /// `begin_commit` calls that opened a new attempt
    transactions_begun: AtomicU64,
    /// `begin_commit` calls repeating the active txid
    transactions_retried: AtomicU64,
    /// `commit` calls naming the active txid
    transactions_committed: AtomicU64,
    /// Keys read through `multi_get`
    keys_read: AtomicU64,
    /// Positions where an update function was invoked
    updates_applied: AtomicU64,
    /// Positions reused because the store already reflected the txid
    updates_skipped: AtomicU64,
    /// Versioned values handed to the cache write path
    values_written: AtomicU64,
    /// Calls refused for lifecycle or length violations
    calls_rejected: AtomicU64,
}

impl StateMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_begun(&self) {
        self.transactions_begun.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retried(&self) {
        self.transactions_retried.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_committed(&self) {
        self.transactions_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_keys_read(&self, n: u64) {
        self.keys_read.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_updates_applied(&self, n: u64) {
        self.updates_applied.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_updates_skipped(&self, n: u64) {
        self.updates_skipped.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_values_written(&self, n: u64) {
        self.values_written.fetch_add(n, Ordering::Relaxed);
    }

    pub fn increment_rejected(&self) {
        self.calls_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            transactions_begun: self.transactions_begun.load(Ordering::Relaxed),
            transactions_retried: self.transactions_retried.load(Ordering::Relaxed),
            transactions_committed: self.transactions_committed.load(Ordering::Relaxed),
            keys_read: self.keys_read.load(Ordering::Relaxed),
            updates_applied: self.updates_applied.load(Ordering::Relaxed),
            updates_skipped: self.updates_skipped.load(Ordering::Relaxed),
            values_written: self.values_written.load(Ordering::Relaxed),
            calls_rejected: self.calls_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Serializable copy of [`StateMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub transactions_begun: u64,
    pub transactions_retried: u64,
    pub transactions_committed: u64,
    pub keys_read: u64,
    pub updates_applied: u64,
    pub updates_skipped: u64,
    pub values_written: u64,
    pub calls_rejected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_zero() {
        assert_eq!(StateMetrics::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = StateMetrics::new();
        metrics.increment_begun();
        metrics.increment_retried();
        metrics.add_updates_applied(3);
        metrics.add_updates_skipped(2);
        metrics.add_values_written(3);

        let snap = metrics.snapshot();
        assert_eq!(snap.transactions_begun, 1);
        assert_eq!(snap.transactions_retried, 1);
        assert_eq!(snap.updates_applied, 3);
        assert_eq!(snap.updates_skipped, 2);
        assert_eq!(snap.values_written, 3);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = StateMetrics::new();
        metrics.increment_committed();
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["transactions_committed"], 1);
    }
}

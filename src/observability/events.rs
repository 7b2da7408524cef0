//! Observable events for txstate
//!
//! Events are explicit and typed. Each one maps to a stable upper-snake
//! name that appears as the `event` field of a log line.

use std::fmt;

/// Observable events emitted by the state map and its stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Transaction lifecycle
    /// A transaction attempt begins
    TxBegin,
    /// `begin_commit` repeated for the active transaction (retry path)
    TxRetry,
    /// A transaction attempt committed
    TxCommit,
    /// `commit` called while idle or with a different txid
    TxCommitMismatch,
    /// A call was refused because the lifecycle precondition failed
    TxRejected,

    // State operations
    /// Batched read served
    StateRead,
    /// Batched update applied
    StateUpdate,
    /// Unconditional batched put applied
    StatePut,

    // Durable store
    /// Durable store opened and indexed
    StoreOpen,
    /// An incomplete trailing record was cut off on open
    StoreTailTruncated,
    /// A batch append failed
    StoreWriteFailed,
    /// Durable store corruption detected (FATAL)
    StoreCorruption,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::TxBegin => "TX_BEGIN",
            Event::TxRetry => "TX_RETRY",
            Event::TxCommit => "TX_COMMIT",
            Event::TxCommitMismatch => "TX_COMMIT_MISMATCH",
            Event::TxRejected => "TX_REJECTED",

            Event::StateRead => "STATE_READ",
            Event::StateUpdate => "STATE_UPDATE",
            Event::StatePut => "STATE_PUT",

            Event::StoreOpen => "STORE_OPEN",
            Event::StoreTailTruncated => "STORE_TAIL_TRUNCATED",
            Event::StoreWriteFailed => "STORE_WRITE_FAILED",
            Event::StoreCorruption => "STORE_CORRUPTION",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::StoreCorruption)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! TxId - Transaction identity of one batch attempt
//!
//! - Assigned externally by the orchestrator
//! - Monotonically increasing across successive batches
//! - Replayed unchanged when an attempt is retried
//!
//! The protocol only compares transaction ids for equality.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque, totally ordered transaction identity.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(u64);

impl TxId {
    /// Creates a new TxId with the given value.
    ///
    /// No Default implementation exists to prevent accidental construction.
    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying value.
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txid_requires_explicit_construction() {
        let id = TxId::new(42);
        assert_eq!(id.value(), 42);
    }

    #[test]
    fn test_txid_equality() {
        assert_eq!(TxId::new(7), TxId::new(7));
        assert_ne!(TxId::new(7), TxId::new(8));
    }

    #[test]
    fn test_txid_serializes_as_number() {
        let json = serde_json::to_string(&TxId::new(12)).unwrap();
        assert_eq!(json, "12");
        let back: TxId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TxId::new(12));
    }

    #[test]
    fn test_txid_display() {
        assert_eq!(TxId::new(99).to_string(), "99");
    }
}

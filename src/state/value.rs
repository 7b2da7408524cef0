//! VersionedValue - Immutable stored value tagged with its writer
//!
//! - A stored value paired with the txid of the transaction that wrote it
//! - Immutable after creation
//! - Updates create new values only
//!
//! This is a PURE TYPE with NO behavior beyond construction and access.

use serde::{Deserialize, Serialize};

use super::TxId;

/// A stored value together with the transaction that produced it.
///
/// All fields are private to enforce immutability. The batch cache and the
/// caller each own their own copy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedValue<T> {
    txid: TxId,
    value: T,
}

impl<T> VersionedValue<T> {
    /// Wrap `value` as written by transaction `txid`.
    pub fn new(txid: TxId, value: T) -> Self {
        Self { txid, value }
    }

    /// Returns the txid of the writing transaction.
    #[inline]
    pub fn txid(&self) -> TxId {
        self.txid
    }

    /// Returns a reference to the stored value.
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Unwrap into the stored value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Returns true if this value was written by `txid`.
    #[inline]
    pub fn written_by(&self, txid: TxId) -> bool {
        self.txid == txid
    }
}

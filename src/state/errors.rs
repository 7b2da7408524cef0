//! State map error types
//!
//! Error codes:
//! - TXSTATE_LENGTH_MISMATCH (contract violation, raised before any I/O)
//! - TXSTATE_NO_ACTIVE_TRANSACTION (lifecycle precondition)
//! - TXSTATE_TRANSACTION_IN_PROGRESS (lifecycle precondition)
//! - store codes, propagated unchanged
//! - config codes, raised only while opening a durable map

use thiserror::Error;

use super::TxId;
use crate::config::ConfigError;
use crate::observability::Severity;
use crate::store::StoreError;

/// Errors surfaced by the transactional state map.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("{operation}: got {keys} keys but {values} {what}")]
    LengthMismatch {
        operation: &'static str,
        what: &'static str,
        keys: usize,
        values: usize,
    },

    #[error("{operation} called with no active transaction")]
    NoActiveTransaction { operation: &'static str },

    #[error("begin_commit({requested}) while transaction {active} is still active")]
    TransactionInProgress { active: TxId, requested: TxId },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl StateError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::LengthMismatch { .. } => "TXSTATE_LENGTH_MISMATCH",
            Self::NoActiveTransaction { .. } => "TXSTATE_NO_ACTIVE_TRANSACTION",
            Self::TransactionInProgress { .. } => "TXSTATE_TRANSACTION_IN_PROGRESS",
            Self::Store(e) => e.code(),
            Self::Config(e) => e.code(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Store(e) => e.severity(),
            _ => Severity::Error,
        }
    }

    /// Returns true for caller mistakes, as opposed to store failures.
    pub fn is_misuse(&self) -> bool {
        !matches!(self, Self::Store(_) | Self::Config(_))
    }
}

/// Result type for state map operations
pub type StateResult<T> = Result<T, StateError>;

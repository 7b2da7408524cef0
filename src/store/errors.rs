//! Store error types
//!
//! Error codes:
//! - TXSTATE_STORE_IO_ERROR (ERROR severity)
//! - TXSTATE_STORE_ENCODE_FAILED (ERROR severity)
//! - TXSTATE_STORE_DECODE_FAILED (ERROR severity)
//! - TXSTATE_STORE_TYPE_MISMATCH (ERROR severity)
//! - TXSTATE_STORE_BATCH_MISMATCH (ERROR severity)
//! - TXSTATE_STORE_UNAVAILABLE (ERROR severity)
//! - TXSTATE_DATA_CORRUPTION (FATAL severity)
//! - TXSTATE_TRUNCATED_TAIL (FATAL severity; repaired on open by `FileStore`)

use std::io;

use thiserror::Error;

use crate::observability::Severity;

/// Failures raised by backing stores and batch caches.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("data corruption at byte offset {offset}: {reason}")]
    Corruption { offset: u64, reason: String },

    /// The file ends inside a record: an append that never completed.
    #[error("truncated record at byte offset {offset}: {reason}")]
    TruncatedTail { offset: u64, reason: String },

    #[error("failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode value for key '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("value for key '{key}' has type tag '{found}', expected '{expected}'")]
    TypeMismatch {
        key: String,
        expected: String,
        found: String,
    },

    #[error("batch has {keys} keys but {values} values")]
    BatchMismatch { keys: usize, values: usize },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a corruption error with byte offset context
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self::Corruption {
            offset,
            reason: reason.into(),
        }
    }

    /// Create a truncated-tail error at the offset of the incomplete record
    pub fn truncated_tail(offset: u64, reason: impl Into<String>) -> Self {
        Self::TruncatedTail {
            offset,
            reason: reason.into(),
        }
    }

    /// Create an unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Check that a batch carries one value per key
    pub fn check_batch(keys: usize, values: usize) -> StoreResult<()> {
        if keys != values {
            return Err(Self::BatchMismatch { keys, values });
        }
        Ok(())
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "TXSTATE_STORE_IO_ERROR",
            Self::Corruption { .. } => "TXSTATE_DATA_CORRUPTION",
            Self::TruncatedTail { .. } => "TXSTATE_TRUNCATED_TAIL",
            Self::Encode { .. } => "TXSTATE_STORE_ENCODE_FAILED",
            Self::Decode { .. } => "TXSTATE_STORE_DECODE_FAILED",
            Self::TypeMismatch { .. } => "TXSTATE_STORE_TYPE_MISMATCH",
            Self::BatchMismatch { .. } => "TXSTATE_STORE_BATCH_MISMATCH",
            Self::Unavailable(_) => "TXSTATE_STORE_UNAVAILABLE",
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        match self {
            Self::Corruption { .. } | Self::TruncatedTail { .. } => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// Returns whether the store must not be used any further
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corruption_is_fatal() {
        let err = StoreError::corruption_at_offset(1024, "checksum mismatch");
        assert!(err.is_fatal());
        assert_eq!(err.code(), "TXSTATE_DATA_CORRUPTION");

        let display = err.to_string();
        assert!(display.contains("1024"));
        assert!(display.contains("checksum mismatch"));
    }

    #[test]
    fn test_truncated_tail_has_own_code() {
        let err = StoreError::truncated_tail(55, "record runs past end of file");
        assert!(err.is_fatal());
        assert_eq!(err.code(), "TXSTATE_TRUNCATED_TAIL");
        assert!(err.to_string().contains("55"));
    }

    #[test]
    fn test_io_error_not_fatal() {
        let err = StoreError::io("disk full", io::Error::new(io::ErrorKind::Other, "disk full"));
        assert!(!err.is_fatal());
        assert_eq!(err.severity(), Severity::Error);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_check_batch() {
        assert!(StoreError::check_batch(2, 2).is_ok());
        let err = StoreError::check_batch(2, 3).unwrap_err();
        assert_eq!(err.code(), "TXSTATE_STORE_BATCH_MISMATCH");
    }
}

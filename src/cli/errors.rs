//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit status.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error, or no data directory given
    ConfigError,
    /// I/O error (stdout, store file)
    IoError,
    /// No store file under the data directory
    NotInitialized,
    /// Verification found a damaged record
    Corruption,
    /// A stored envelope could not be decoded
    DecodeFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "TXSTATE_CLI_CONFIG_ERROR",
            Self::IoError => "TXSTATE_CLI_IO_ERROR",
            Self::NotInitialized => "TXSTATE_CLI_NOT_INITIALIZED",
            Self::Corruption => "TXSTATE_CLI_CORRUPTION",
            Self::DecodeFailed => "TXSTATE_CLI_DECODE_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug, Error)]
#[error("{}: {message}", .code.code())]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn not_initialized(path: &std::path::Path) -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            format!("No state store at {}", path.display()),
        )
    }

    /// Get the error code
    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        let code = match &e {
            StoreError::Corruption { .. } | StoreError::TruncatedTail { .. } => {
                CliErrorCode::Corruption
            }
            StoreError::Decode { .. } | StoreError::TypeMismatch { .. } => {
                CliErrorCode::DecodeFailed
            }
            _ => CliErrorCode::IoError,
        };
        Self::new(code, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_code() {
        let err = CliError::config_error("no data_dir");
        assert_eq!(err.to_string(), "TXSTATE_CLI_CONFIG_ERROR: no data_dir");
    }

    #[test]
    fn test_store_errors_map_to_cli_codes() {
        let err: CliError = StoreError::corruption_at_offset(12, "checksum").into();
        assert_eq!(err.code(), CliErrorCode::Corruption);

        let err: CliError = StoreError::truncated_tail(40, "record runs past end of file").into();
        assert_eq!(err.code(), CliErrorCode::Corruption);

        let err: CliError = StoreError::unavailable("down").into();
        assert_eq!(err.code_str(), "TXSTATE_CLI_IO_ERROR");
    }
}

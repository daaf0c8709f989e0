//! Error types for the wallet contract
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using WalletError
pub type Result<T> = std::result::Result<T, WalletError>;

/// Unified error type for wallet operations
#[derive(Debug, Error)]
pub enum WalletError {
    // -------------------------------------------------------------------------
    // Invocation Errors
    // -------------------------------------------------------------------------
    #[error("Incorrect number of arguments for {function}. Expecting {expected}, got {got}")]
    Arity {
        function: &'static str,
        expected: String,
        got: usize,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid Smart Contract function name: {0}")]
    InvalidFunction(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Host Store Errors
    // -------------------------------------------------------------------------
    #[error("Store error: {0}")]
    Store(String),

    #[error("Query not supported by this store: {0}")]
    UnsupportedQuery(String),

    #[error("Invalid composite key: {0}")]
    InvalidCompositeKey(String),

    // -------------------------------------------------------------------------
    // I/O and Snapshot Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot corruption detected: {0}")]
    SnapshotCorruption(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for WalletError {
    fn from(err: bincode::Error) -> Self {
        WalletError::Serialization(err.to_string())
    }
}

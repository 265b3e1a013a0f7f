//! Error types for chronicle core operations.
//!
//! Errors are descriptive at the core level; the CLI layer maps these to
//! user-facing messages. Expected password failures surface as
//! `AuthenticationFailed` so callers can distinguish them from I/O or
//! corruption problems.

use thiserror::Error;

/// Result type alias for chronicle operations.
pub type Result<T> = std::result::Result<T, ChronicleError>;

/// Core error type for chronicle operations.
#[derive(Debug, Error)]
pub enum ChronicleError {
    /// The vault file does not exist yet; recoverable by bootstrapping.
    #[error("Vault is not initialized")]
    NotInitialized,

    /// Wrong password, or a tampered/corrupted encrypted artifact.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Encryption or key derivation error
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Storage backend error (generic)
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite-specific storage error
    #[error("SQLite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    /// A malformed line on the capture process's stdout
    #[error("Malformed capture event: {0}")]
    Decode(String),

    /// Capture process spawn or lifecycle error
    #[error("Capture process error: {0}")]
    Process(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

//! Error types for w24fs
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using W24Error
pub type Result<T> = std::result::Result<T, W24Error>;

/// Unified error type for w24fs operations
#[derive(Debug, Error)]
pub enum W24Error {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    /// Rejected locally, before anything is written to the socket
    #[error("{0}")]
    Validation(String),

    /// Well-formed command whose operands cannot describe a selection
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    // -------------------------------------------------------------------------
    // Archive Errors
    // -------------------------------------------------------------------------
    #[error("Archive construction failed: {0}")]
    Archive(String),

    // -------------------------------------------------------------------------
    // Transfer / Network Errors
    // -------------------------------------------------------------------------
    #[error("Incomplete transfer: expected {expected} bytes, received {received}")]
    IncompleteTransfer { expected: u64, received: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl W24Error {
    /// True when the peer went away (EOF, reset, abort, broken pipe)
    pub fn is_disconnect(&self) -> bool {
        match self {
            W24Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

//! Error types for search-dl
//!
//! This module provides the error taxonomy for the library:
//! - Search failures surfaced by the network search collaborator
//! - Prompt failures surfaced by the operator selection collaborator
//! - Download/transfer failures (reported by the download coordinator, never
//!   propagated into the orchestration loop)
//! - Configuration and startup errors handled by the runner

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for search-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for search-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "search.timeout")
        key: Option<String>,
    },

    /// The search service answered, but not with a usable result set
    #[error("search failed: {0}")]
    Search(String),

    /// Network error (connection refused, timeout, malformed body)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The operator prompt could not be shown or was aborted
    #[error("prompt failed: {0}")]
    Prompt(String),

    /// Download-related error
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A cycle was requested while the query queue had nothing left
    #[error("no pending query: the query queue is exhausted")]
    NoPendingQuery,
}

impl Error {
    /// Shorthand for a configuration error tied to a config key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Whether this error was caused by the collaborator's timeout expiring
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Network(e) => e.is_timeout(),
            Error::Io(e) => e.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}

/// Download-related errors
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The transfer endpoint answered with a non-success status
    #[error("transfer of {path} failed with HTTP status {status}")]
    Http {
        /// HTTP status code returned by the transfer endpoint
        status: u16,
        /// Remote path of the file being transferred
        path: String,
    },

    /// The remote path cannot be mapped to a local destination
    #[error("invalid remote path: {0}")]
    InvalidPath(String),

    /// The local destination could not be prepared
    #[error("cannot write to {path}: {reason}")]
    Destination {
        /// Local path that could not be written
        path: PathBuf,
        /// Underlying reason
        reason: String,
    },
}

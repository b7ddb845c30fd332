// src/error.rs
//! Error types for subhunter
//!
//! Only configuration problems are fatal. Everything that goes wrong while a
//! scan is running is absorbed at the source or pool boundary and recorded in
//! the report as data (see [`crate::types::SourceStats`]).

use std::path::PathBuf;
use thiserror::Error;

/// Fatal problems detected before any network I/O starts
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid domain format: {0:?}")]
    InvalidDomain(String),

    #[error("thread count must be greater than 0")]
    InvalidThreads,

    #[error("timeout must be greater than 0")]
    InvalidTimeout,

    #[error("brute-force is enabled but no wordlist was given")]
    MissingWordlist,

    #[error("wordlist not found: {}", .0.display())]
    WordlistNotFound(PathBuf),

    #[error("wordlist {} could not be read: {source}", .path.display())]
    WordlistUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure writing an export file. The in-memory report stays valid.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

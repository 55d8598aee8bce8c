//! Error types shared across the Quarry crates.
//!
//! Almost everything in Quarry degrades instead of failing: a file that
//! can't be read is skipped, a corrupt persisted index is rebuilt. The
//! variants here are the few things that do reach a caller.

use crate::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience type for fallible Quarry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Things that can go wrong badly enough to tell the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// Couldn't read or stat something on disk.
    #[error("failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing persisted state failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The fingerprint collaborator could not produce a fingerprint.
    #[error("fingerprint unavailable: {0}")]
    Fingerprint(String),

    /// The config file exists but couldn't be parsed.
    #[error("invalid config '{path}': {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The watcher task went away while a command was in flight.
    #[error("watcher task is no longer running")]
    WatcherClosed,

    /// A blocking scan task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Creates an IO error with the path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

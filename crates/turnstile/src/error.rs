//! # Torture Harness Error Types
//!
//! Everything that can stop a torture run or fail its verdict.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while configuring or running a torture run.
#[derive(Error, Debug)]
pub enum TortureError {
    /// Config file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    ConfigIo {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`TortureConfig`](crate::TortureConfig).
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A worker observed a writer overlapping another party.
    #[error("mutual exclusion violated {count} times")]
    MutualExclusionViolated {
        /// Number of critical sections that saw an overlap.
        count: u64,
    },

    /// The ledger guarded by the lock lost or duplicated writes.
    #[error("ledger mismatch: workers reported {reported} writes, ledger holds {recorded}")]
    LedgerMismatch {
        /// Writes the workers claim to have made.
        reported: u64,
        /// Writes the protected ledger actually saw.
        recorded: u64,
    },

    /// A worker thread panicked.
    #[error("worker {0} panicked")]
    WorkerPanicked(usize),
}

/// Result type for torture harness operations.
pub type TortureResult<T> = Result<T, TortureError>;

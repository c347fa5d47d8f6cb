//! Error types for comprobar operations
//!
//! A single crate-wide error enum plus the usual `Result` alias. The
//! discrepancy verdict itself is never an error: a run that finds a
//! divergence still completes normally and reports `BUG? YES`. The one
//! fatal condition (auxiliary feature count != 1 inside the parallel
//! pass) terminates the process directly and never surfaces here.

use thiserror::Error;

/// Error type for prober configuration, threading, and report export
#[derive(Debug, Error)]
pub enum ComprobarError {
    /// Probe configuration rejected before any pass ran
    #[error("Invalid probe configuration: {reason}")]
    InvalidConfiguration {
        /// Explanation of what was rejected
        reason: String,
    },

    /// Dedicated rayon pool could not be constructed
    #[error("Thread pool error: {reason}")]
    ThreadPool {
        /// Builder failure description
        reason: String,
    },

    /// Report serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Report file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for comprobar operations
pub type Result<T> = std::result::Result<T, ComprobarError>;

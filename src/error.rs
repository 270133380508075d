//! Error types for tsad-bench
//!
//! Errors follow the benchmark's failure taxonomy:
//! - Configuration errors are fatal for an experiment and raised before any output is written
//! - Metric errors are recovered per metric and only escalated on total failure
//! - Host probe errors are fatal at `ResourceConstraints` construction
//! - Adapter errors (including timeouts) are fatal for the affected experiment only

use std::time::Duration;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// tsad-bench error types
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid experiment or algorithm configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Dataset split could not be resolved to a path
    #[error("Dataset not found: {collection}/{name} ({split} split)")]
    DatasetNotFound {
        /// Dataset collection name
        collection: String,
        /// Dataset name
        name: String,
        /// Requested split ("train" or "test")
        split: &'static str,
    },

    /// Heuristic parameter could not be resolved
    #[error("Heuristic error: {0}")]
    Heuristic(String),

    /// Metric input validation failed
    #[error("Invalid metric input: {0}")]
    Validation(String),

    /// Metric computation failed on validated input
    #[error("Metric error: {0}")]
    Metric(String),

    /// Algorithm adapter (or a pre/post-processing transform) failed
    #[error("Adapter error: {0:#}")]
    Adapter(#[from] anyhow::Error),

    /// Algorithm adapter exceeded its time budget
    #[error("{phase} timed out after {:.1}s", .after.as_secs_f64())]
    Timeout {
        /// Phase that was cancelled ("training" or "execution")
        phase: &'static str,
        /// Configured timeout
        after: Duration,
    },

    /// Reading host memory / CPU information failed
    #[error("Host resource probe failed: {0}\nSet explicit task memory and CPU limits instead")]
    HostProbe(String),

    /// Dataset or result file has an unexpected structure
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow CSV error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error was caused by an adapter timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// The error's own message, without the category prefix of `Display`.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Configuration(message)
            | Self::Heuristic(message)
            | Self::Validation(message)
            | Self::Metric(message)
            | Self::HostProbe(message)
            | Self::Storage(message)
            | Self::Other(message) => message.clone(),
            Self::Adapter(error) => format!("{error:#}"),
            Self::Io(error) => error.to_string(),
            Self::Arrow(error) => error.to_string(),
            Self::Json(error) => error.to_string(),
            Self::DatasetNotFound { .. } | Self::Timeout { .. } => self.to_string(),
        }
    }
}

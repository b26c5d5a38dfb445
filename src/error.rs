//! Error types shared by the solver and the play layer.

use thiserror::Error;

use crate::exact::config::ConfigError;

/// Errors that can occur while solving or playing.
#[derive(Debug, Error)]
pub enum SolverError {
    /// A board state or flip that is not a subset of the declared tile set,
    /// or a value list with zero, duplicate or out-of-range entries.
    #[error("Invalid board state: {0}")]
    InvalidState(String),

    /// The solver configuration was rejected before any computation started.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reading or writing a snapshot / solution file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot was produced for a different tile set or dice.
    #[error("Snapshot mismatch: {0}")]
    SnapshotMismatch(String),

    /// The dedicated worker pool for a parallel solve could not be built.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SolverError>;

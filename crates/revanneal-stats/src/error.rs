//! Error types for the statistics crate.

use revanneal_ir::IrError;
use thiserror::Error;

/// Errors that can occur while summarising or plotting runs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    /// No reads to summarise.
    #[error("No samples to summarise")]
    Empty,

    /// Samples could not be compared or evaluated.
    #[error(transparent)]
    Ir(#[from] IrError),

    /// Rendering failed.
    #[error("Plot error: {0}")]
    Plot(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for statistics operations.
pub type StatsResult<T> = Result<T, StatsError>;

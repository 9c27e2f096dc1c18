//! Experiment runners.

pub mod reverse;
pub mod sweep;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use revanneal_hal::HalError;
use revanneal_ir::IrError;
use revanneal_stats::StatsError;

pub use reverse::{ExperimentResult, ReverseAnnealExperiment, fit_ramp_up};
pub use sweep::SweepRunner;

/// Errors from running an experiment.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Sampler(#[from] HalError),

    #[error(transparent)]
    Ir(#[from] IrError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error("Sampler returned no samples")]
    NoSamples,

    #[error("Sweep has no s_target values")]
    NoTargets,

    #[error("Cannot serialize results: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot write {path}: {message}")]
    Io { path: String, message: String },
}

/// Result type for runners.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Source of the ground-state energy a run is scored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundReference {
    /// Exhaustive enumeration.
    Exact,
    /// Lowest energy observed by the sampler.
    Observed,
}

/// Pretty-printed JSON to `path`.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> RunnerResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|e| RunnerError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

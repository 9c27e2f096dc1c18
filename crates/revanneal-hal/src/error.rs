//! Error types for the HAL crate.

use revanneal_ir::IrError;
use thiserror::Error;

/// Errors that can occur in sampler operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Solver is offline or not accepting problems.
    #[error("Solver not available: {0}")]
    SolverUnavailable(String),

    /// No solver matched the request.
    #[error("Solver not found: {0}")]
    SolverNotFound(String),

    /// Problem does not fit the solver's working graph or ranges.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// Anneal schedule rejected.
    #[error("Invalid anneal schedule: {0}")]
    InvalidSchedule(String),

    /// Sampling parameter rejected.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Problem submission failed.
    #[error("Problem submission failed: {0}")]
    SubmissionFailed(String),

    /// Problem execution failed on the solver.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Problem was cancelled.
    #[error("Job cancelled")]
    JobCancelled,

    /// Problem not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Timeout waiting for a problem.
    #[error("Timeout waiting for job {0}")]
    Timeout(String),

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Problem representation error.
    #[error(transparent)]
    Ir(IrError),

    /// Generic backend error.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<IrError> for HalError {
    fn from(e: IrError) -> Self {
        match e {
            IrError::InvalidSchedule(msg) => HalError::InvalidSchedule(msg),
            other => HalError::Ir(other),
        }
    }
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_error_maps_to_invalid_schedule() {
        let err: HalError = IrError::InvalidSchedule("too steep".into()).into();
        assert!(matches!(err, HalError::InvalidSchedule(msg) if msg == "too steep"));
    }

    #[test]
    fn test_other_ir_errors_are_wrapped() {
        let err: HalError = IrError::MissingVariable(3).into();
        assert!(matches!(err, HalError::Ir(IrError::MissingVariable(3))));
        assert!(err.to_string().contains("Variable 3"));
    }
}

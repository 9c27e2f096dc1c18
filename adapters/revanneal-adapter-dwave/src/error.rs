//! Error types for the D-Wave adapter.

use revanneal_hal::HalError;
use revanneal_ir::IrError;
use thiserror::Error;

/// Result type for D-Wave operations.
pub type DWaveResult<T> = Result<T, DWaveError>;

/// Errors that can occur when interacting with SAPI.
#[derive(Debug, Error)]
pub enum DWaveError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing SAPI token.
    #[error("Missing SAPI token: set DWAVE_API_TOKEN environment variable")]
    MissingToken,

    /// Token rejected.
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// Requested solver does not exist.
    #[error("Solver not found: {0}")]
    SolverNotFound(String),

    /// No online QPU solver is visible to this token.
    #[error("No online QPU solver available")]
    NoSolverAvailable,

    /// Problem not found.
    #[error("Problem not found: {0}")]
    ProblemNotFound(String),

    /// SAPI rejected the submission.
    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    /// Problem failed on the solver.
    #[error("Problem failed: {0}")]
    ProblemFailed(String),

    /// `qp` encoding or decoding failed.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Decoded samples are not valid spin assignments.
    #[error(transparent)]
    Ir(#[from] IrError),

    /// Malformed base64 payload.
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl From<DWaveError> for HalError {
    fn from(e: DWaveError) -> Self {
        match e {
            DWaveError::MissingToken | DWaveError::Unauthorized { .. } => {
                HalError::AuthenticationFailed(e.to_string())
            }
            DWaveError::Http(err) => HalError::Network(err),
            DWaveError::Json(err) => HalError::Serialization(err),
            DWaveError::SolverNotFound(id) => HalError::SolverNotFound(id),
            DWaveError::NoSolverAvailable => HalError::SolverUnavailable(e.to_string()),
            DWaveError::ProblemNotFound(id) => HalError::JobNotFound(id),
            DWaveError::SubmissionRejected(msg) => HalError::SubmissionFailed(msg),
            DWaveError::ProblemFailed(msg) => HalError::JobFailed(msg),
            DWaveError::Ir(err) => err.into(),
            _ => HalError::Backend(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_display() {
        let err = DWaveError::MissingToken;
        assert!(err.to_string().contains("DWAVE_API_TOKEN"));
    }

    #[test]
    fn test_api_error_display() {
        let err = DWaveError::ApiError {
            status: 503,
            message: "Service unavailable".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("Service unavailable"));
    }

    #[test]
    fn test_auth_errors_to_hal() {
        let hal: HalError = DWaveError::MissingToken.into();
        assert!(matches!(hal, HalError::AuthenticationFailed(_)));

        let hal: HalError = DWaveError::Unauthorized {
            status: 401,
            message: "bad token".into(),
        }
        .into();
        assert!(matches!(hal, HalError::AuthenticationFailed(msg) if msg.contains("bad token")));
    }

    #[test]
    fn test_problem_errors_to_hal() {
        let hal: HalError = DWaveError::ProblemNotFound("p1".into()).into();
        assert!(matches!(hal, HalError::JobNotFound(id) if id == "p1"));

        let hal: HalError = DWaveError::ProblemFailed("Problem timed out".into()).into();
        assert!(matches!(hal, HalError::JobFailed(msg) if msg == "Problem timed out"));

        let hal: HalError = DWaveError::SubmissionRejected("quota".into()).into();
        assert!(matches!(hal, HalError::SubmissionFailed(_)));
    }

    #[test]
    fn test_solver_errors_to_hal() {
        let hal: HalError = DWaveError::SolverNotFound("Advantage_system9.9".into()).into();
        assert!(matches!(hal, HalError::SolverNotFound(id) if id == "Advantage_system9.9"));

        let hal: HalError = DWaveError::NoSolverAvailable.into();
        assert!(matches!(hal, HalError::SolverUnavailable(_)));
    }

    #[test]
    fn test_other_errors_to_backend() {
        let hal: HalError = DWaveError::ApiError {
            status: 500,
            message: "internal".into(),
        }
        .into();
        assert!(matches!(hal, HalError::Backend(_)));

        let hal: HalError = DWaveError::Codec("short buffer".into()).into();
        assert!(matches!(hal, HalError::Backend(msg) if msg.contains("short buffer")));
    }
}

//! Error types for the IR crate.

use thiserror::Error;

use crate::ising::NodeId;

/// Errors that can occur while building or evaluating problems, schedules
/// and sample sets.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// A spin assignment does not cover a problem variable.
    #[error("Variable {0} has no spin in the assignment")]
    MissingVariable(NodeId),

    /// Two assignments are defined over different variable sets.
    #[error("Assignments cover different variables ({left} vs {right} spins)")]
    VariableMismatch {
        /// Number of variables on the left-hand side.
        left: usize,
        /// Number of variables on the right-hand side.
        right: usize,
    },

    /// A spin value other than +1 or -1.
    #[error("Invalid spin {value} for variable {node} (expected +1 or -1)")]
    InvalidSpin {
        /// Variable carrying the bad value.
        node: NodeId,
        /// The offending value.
        value: i8,
    },

    /// A coupling of a variable with itself where none is allowed.
    #[error("Self-coupling on variable {0}")]
    SelfCoupling(NodeId),

    /// A sample set record does not cover the set's variables.
    #[error("Record {index} covers {found} variables, sample set has {expected}")]
    RecordMismatch {
        /// Position of the record.
        index: usize,
        /// Variables in the sample set.
        expected: usize,
        /// Variables in the record.
        found: usize,
    },

    /// A bias, coupling or offset is NaN or infinite.
    #[error("Non-finite coefficient: {0}")]
    NonFiniteCoefficient(String),

    /// The problem has no variables.
    #[error("Problem has no variables")]
    EmptyProblem,

    /// Exhaustive enumeration refused.
    #[error("Problem has {num_variables} variables, exact solver is limited to {max}")]
    ProblemTooLarge {
        /// Variables in the problem.
        num_variables: usize,
        /// Enumeration limit.
        max: usize,
    },

    /// The anneal schedule violates a structural or solver constraint.
    #[error("Invalid anneal schedule: {0}")]
    InvalidSchedule(String),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;

//! Problem instances placed on a solver's working graph.

pub mod graph;
pub mod instances;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use revanneal_hal::SolverProperties;
use revanneal_ir::{IrError, IsingModel, NodeId};

pub use graph::{select_connected_qubits, select_path};
pub use instances::{CHAIN_END_BIAS, ferromagnetic_chain, from_json, frustrated_loop, spin_glass};

/// Errors from building problem instances.
#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("Problem size must be at least 1 (2 for chains), got {0}")]
    InvalidSize(usize),

    #[error("Qubit {0} is not an active qubit")]
    InactiveQubit(NodeId),

    #[error("Not enough connected qubits for {requested} spins{}", .seed.map(|s| format!(" from qubit {s}")).unwrap_or_default())]
    NotEnoughQubits {
        requested: usize,
        seed: Option<NodeId>,
    },

    #[error("Selected qubits share no active coupler")]
    NoCouplers,

    #[error("Selected couplers contain no cycle to frustrate")]
    NoCycle,

    #[error("Cannot read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid problem file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Ir(#[from] IrError),
}

/// Result type for problem construction.
pub type ProblemResult<T> = Result<T, ProblemError>;

/// Built-in problem families.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ProblemKind {
    /// Random ±1 couplings on a connected patch.
    #[default]
    SpinGlass,
    /// Ferromagnetic chain along a path.
    Chain,
    /// Ferromagnetic patch with one frustrated cycle.
    FrustratedLoop,
}

impl std::fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProblemKind::SpinGlass => write!(f, "spin_glass"),
            ProblemKind::Chain => write!(f, "chain"),
            ProblemKind::FrustratedLoop => write!(f, "frustrated_loop"),
        }
    }
}

/// Build a `size`-spin instance of `kind` on the solver's working graph.
pub fn build_problem(
    kind: ProblemKind,
    properties: &SolverProperties,
    size: usize,
    seed_qubit: Option<NodeId>,
    seed: u64,
) -> ProblemResult<IsingModel> {
    match kind {
        ProblemKind::SpinGlass => {
            let qubits = select_connected_qubits(properties, size, seed_qubit)?;
            spin_glass(properties, &qubits, seed)
        }
        ProblemKind::Chain => {
            let qubits = select_path(properties, size, seed_qubit)?;
            ferromagnetic_chain(&qubits)
        }
        ProblemKind::FrustratedLoop => {
            let qubits = select_connected_qubits(properties, size, seed_qubit)?;
            frustrated_loop(properties, &qubits)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> SolverProperties {
        // 0-1-2-3 over 4-5-6-7 with rungs.
        SolverProperties::from_graph(
            (0..8).collect(),
            vec![
                [0, 1], [1, 2], [2, 3],
                [4, 5], [5, 6], [6, 7],
                [0, 4], [1, 5], [2, 6], [3, 7],
            ],
        )
    }

    #[test]
    fn test_build_each_kind() {
        let props = ladder();
        for kind in [ProblemKind::SpinGlass, ProblemKind::Chain, ProblemKind::FrustratedLoop] {
            let model = build_problem(kind, &props, 6, None, 42).unwrap();
            assert_eq!(model.num_variables(), 6, "{kind}");
            for ((u, v), _) in model.couplings() {
                assert!(props.has_coupler(u, v), "{kind}: ({u}, {v})");
            }
        }
    }

    #[test]
    fn test_not_enough_qubits_message() {
        let err = build_problem(ProblemKind::SpinGlass, &ladder(), 9, Some(0), 1).unwrap_err();
        assert_eq!(err.to_string(), "Not enough connected qubits for 9 spins from qubit 0");
    }

    #[test]
    fn test_kind_names() {
        let kind: ProblemKind = serde_json::from_str("\"frustrated_loop\"").unwrap();
        assert_eq!(kind, ProblemKind::FrustratedLoop);
        assert_eq!(ProblemKind::Chain.to_string(), "chain");
    }
}

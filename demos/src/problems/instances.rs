//! Ising problem instances on selected qubits.

use std::collections::BTreeSet;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use revanneal_hal::SolverProperties;
use revanneal_ir::{IrError, IsingModel, NodeId};

use super::{ProblemError, ProblemResult};

/// Bias placed on the first qubit of a chain to break the up/down symmetry.
pub const CHAIN_END_BIAS: f64 = -0.1;

/// Active couplers with both ends in `qubits`, in solver coupler order.
fn couplers_within(properties: &SolverProperties, qubits: &[NodeId]) -> Vec<(NodeId, NodeId)> {
    let set: BTreeSet<NodeId> = qubits.iter().copied().collect();
    properties
        .couplers
        .iter()
        .filter(|[a, b]| set.contains(a) && set.contains(b))
        .map(|&[a, b]| if a < b { (a, b) } else { (b, a) })
        .collect()
}

/// Random ±1 spin glass: `h = 0`, `J = ±1` on every active coupler among
/// `qubits`. The same seed gives the same instance.
pub fn spin_glass(properties: &SolverProperties, qubits: &[NodeId], seed: u64) -> ProblemResult<IsingModel> {
    let edges = couplers_within(properties, qubits);
    if edges.is_empty() {
        return Err(ProblemError::NoCouplers);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut model = IsingModel::new();
    for &q in qubits {
        model.set_bias(q, 0.0);
    }
    for (u, v) in edges {
        let value = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        model.set_coupling(u, v, value)?;
    }
    Ok(model)
}

/// Ferromagnetic chain along `qubits` in order: `J = -1` between neighbours
/// and a small bias on the first qubit.
///
/// The unique ground state has every spin `+1`.
pub fn ferromagnetic_chain(qubits: &[NodeId]) -> ProblemResult<IsingModel> {
    if qubits.len() < 2 {
        return Err(ProblemError::InvalidSize(qubits.len()));
    }
    let mut model = IsingModel::new();
    for &q in qubits {
        model.set_bias(q, 0.0);
    }
    model.set_bias(qubits[0], CHAIN_END_BIAS);
    for pair in qubits.windows(2) {
        model.set_coupling(pair[0], pair[1], -1.0)?;
    }
    Ok(model)
}

/// Ferromagnetic couplers on every active coupler among `qubits`, with the
/// first coupler that lies on a cycle flipped to antiferromagnetic.
///
/// Fails with [`ProblemError::NoCycle`] when the couplers form a tree.
pub fn frustrated_loop(properties: &SolverProperties, qubits: &[NodeId]) -> ProblemResult<IsingModel> {
    let edges = couplers_within(properties, qubits);
    if edges.is_empty() {
        return Err(ProblemError::NoCouplers);
    }

    let flipped = edges
        .iter()
        .position(|&edge| lies_on_cycle(&edges, edge))
        .ok_or(ProblemError::NoCycle)?;

    let mut model = IsingModel::new();
    for &q in qubits {
        model.set_bias(q, 0.0);
    }
    for (i, &(u, v)) in edges.iter().enumerate() {
        model.set_coupling(u, v, if i == flipped { 1.0 } else { -1.0 })?;
    }
    Ok(model)
}

/// An edge lies on a cycle iff its endpoints stay connected without it.
fn lies_on_cycle(edges: &[(NodeId, NodeId)], edge: (NodeId, NodeId)) -> bool {
    let (from, to) = edge;
    let mut reached = BTreeSet::from([from]);
    let mut frontier = vec![from];
    while let Some(q) = frontier.pop() {
        for &(a, b) in edges {
            if (a, b) == edge {
                continue;
            }
            let other = if a == q {
                b
            } else if b == q {
                a
            } else {
                continue;
            };
            if other == to {
                return true;
            }
            if reached.insert(other) {
                frontier.push(other);
            }
        }
    }
    false
}

/// Load a problem from JSON: `{"h": {"0": 0.5}, "J": [[0, 4, -1.0]], "offset": 0.0}`.
pub fn from_json(path: &Path) -> ProblemResult<IsingModel> {
    let contents = std::fs::read_to_string(path).map_err(|e| ProblemError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let model: IsingModel = serde_json::from_str(&contents)?;
    model.validate()?;
    if model.is_empty() {
        return Err(IrError::EmptyProblem.into());
    }
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use revanneal_ir::{ExactSolver, SpinAssignment};

    /// Square 0-1-2-3-0 plus a pendant 3-4.
    fn square_with_tail() -> SolverProperties {
        SolverProperties::from_graph(
            vec![0, 1, 2, 3, 4],
            vec![[0, 1], [3, 4], [1, 2], [2, 3], [0, 3]],
        )
    }

    #[test]
    fn test_spin_glass_is_seeded() {
        let props = square_with_tail();
        let qubits = [0, 1, 2, 3, 4];
        let a = spin_glass(&props, &qubits, 7).unwrap();
        let b = spin_glass(&props, &qubits, 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.num_interactions(), 5);
        assert!(a.couplings().all(|(_, j)| j == 1.0 || j == -1.0));
        assert!(a.biases().all(|(_, h)| h == 0.0));
    }

    #[test]
    fn test_spin_glass_ignores_outside_couplers() {
        let props = square_with_tail();
        let model = spin_glass(&props, &[0, 1, 2], 1).unwrap();
        assert_eq!(model.num_interactions(), 2);
        assert_eq!(model.coupling(0, 3), 0.0);
    }

    #[test]
    fn test_chain_ground_state() {
        let model = ferromagnetic_chain(&[5, 9, 2, 7]).unwrap();
        assert_eq!(model.num_interactions(), 3);
        assert_eq!(model.bias(5), CHAIN_END_BIAS);

        let ground = ExactSolver::ground_state(&model).unwrap();
        assert_eq!(ground.degeneracy(), 1);
        assert_eq!(ground.assignments[0], SpinAssignment::all_up(&[2, 5, 7, 9]));
        assert!((ground.energy - (-3.0 + CHAIN_END_BIAS)).abs() < 1e-12);
    }

    #[test]
    fn test_chain_needs_two_qubits() {
        assert!(matches!(ferromagnetic_chain(&[3]), Err(ProblemError::InvalidSize(1))));
    }

    #[test]
    fn test_chain_rejects_repeated_neighbour() {
        assert!(matches!(
            ferromagnetic_chain(&[1, 4, 4]),
            Err(ProblemError::Ir(IrError::SelfCoupling(4)))
        ));
    }

    #[test]
    fn test_frustrated_loop_flips_cycle_edge() {
        let props = square_with_tail();
        let model = frustrated_loop(&props, &[0, 1, 2, 3, 4]).unwrap();
        // (3, 4) is a bridge, so the first cycle edge is (0, 1).
        assert_eq!(model.coupling(0, 1), 1.0);
        assert_eq!(model.coupling(3, 4), -1.0);
        let positive = model.couplings().filter(|&(_, j)| j > 0.0).count();
        assert_eq!(positive, 1);

        // The frustrated square leaves one bond unsatisfied (-2); the tail adds -1.
        let ground = ExactSolver::ground_state(&model).unwrap();
        assert!((ground.energy + 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_frustrated_loop_needs_cycle() {
        let props = square_with_tail();
        let err = frustrated_loop(&props, &[2, 3, 4]).unwrap_err();
        assert!(matches!(err, ProblemError::NoCycle));
    }

    #[test]
    fn test_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("problem.json");
        std::fs::write(&path, r#"{"h": {"0": 0.5, "4": -0.5}, "J": [[0, 4, -1.0]]}"#).unwrap();

        let model = from_json(&path).unwrap();
        assert_eq!(model.bias(0), 0.5);
        assert_eq!(model.coupling(4, 0), -1.0);

        let missing = from_json(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, ProblemError::Io { .. }));
    }
}

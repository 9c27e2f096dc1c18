//! Exhaustive ground-state search for small problems.
//!
//! Used as the reference energy when counting ground-state hits. States are
//! visited in Gray-code order so each step flips a single spin and the
//! energy is updated from the local field instead of being recomputed.

use crate::error::{IrError, IrResult};
use crate::ising::{IsingModel, NodeId};
use crate::sample::SpinAssignment;

/// Largest problem the exact solver will enumerate.
pub const MAX_EXACT_VARIABLES: usize = 24;

/// Maximum number of degenerate ground states kept.
const MAX_DEGENERATE_STATES: usize = 64;

/// Energies closer than this are treated as degenerate.
const DEGENERACY_TOLERANCE: f64 = 1e-9;

/// Ground state of a problem.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundState {
    /// Minimum energy.
    pub energy: f64,
    /// Assignments reaching the minimum, up to an internal cap.
    pub assignments: Vec<SpinAssignment>,
    /// True if more degenerate minima exist than were kept.
    pub truncated: bool,
}

impl GroundState {
    /// Number of ground states kept.
    pub fn degeneracy(&self) -> usize {
        self.assignments.len()
    }
}

/// Brute-force enumerator over all `2^n` spin configurations.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactSolver;

impl ExactSolver {
    /// Enumerate every configuration of `model` and return its ground state.
    pub fn ground_state(model: &IsingModel) -> IrResult<GroundState> {
        model.validate()?;
        let vars = model.variables();
        let n = vars.len();
        if n == 0 {
            return Err(IrError::EmptyProblem);
        }
        if n > MAX_EXACT_VARIABLES {
            return Err(IrError::ProblemTooLarge {
                num_variables: n,
                max: MAX_EXACT_VARIABLES,
            });
        }

        let index_of = |node: NodeId| vars.binary_search(&node).unwrap_or(usize::MAX);
        let h: Vec<f64> = vars.iter().map(|&v| model.bias(v)).collect();
        let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for ((u, v), j) in model.couplings() {
            let (a, b) = (index_of(u), index_of(v));
            adjacency[a].push((b, j));
            adjacency[b].push((a, j));
        }

        // Start from all spins down.
        let mut spins = vec![-1.0_f64; n];
        let mut energy = model.offset() - h.iter().sum::<f64>();
        for ((_, _), j) in model.couplings() {
            energy += j;
        }

        let mut best_energy = energy;
        let mut best_states: Vec<u32> = vec![0];
        let mut truncated = false;
        let mut gray: u32 = 0;

        for k in 1..(1u64 << n) {
            let bit = k.trailing_zeros() as usize;
            let local: f64 = h[bit]
                + adjacency[bit]
                    .iter()
                    .map(|&(other, j)| j * spins[other])
                    .sum::<f64>();
            energy += -2.0 * spins[bit] * local;
            spins[bit] = -spins[bit];
            gray ^= 1 << bit;

            if energy < best_energy - DEGENERACY_TOLERANCE {
                best_energy = energy;
                best_states.clear();
                best_states.push(gray);
                truncated = false;
            } else if (energy - best_energy).abs() <= DEGENERACY_TOLERANCE {
                if best_states.len() < MAX_DEGENERATE_STATES {
                    best_states.push(gray);
                } else {
                    truncated = true;
                }
            }
        }

        let assignments = best_states
            .into_iter()
            .map(|bits| {
                SpinAssignment::from_pairs(
                    vars.iter()
                        .enumerate()
                        .map(|(i, &v)| (v, if (bits >> i) & 1 == 1 { 1 } else { -1 })),
                )
            })
            .collect::<IrResult<Vec<_>>>()?;

        // Re-evaluate directly to shed accumulated rounding from the walk.
        let energy = model.energy(&assignments[0])?;

        Ok(GroundState {
            energy,
            assignments,
            truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ferromagnetic_pair() {
        let model = IsingModel::from_parts([], [((0, 1), -1.0)]);
        let gs = ExactSolver::ground_state(&model).unwrap();
        assert_eq!(gs.energy, -1.0);
        assert_eq!(gs.degeneracy(), 2);
    }

    #[test]
    fn test_bias_breaks_degeneracy() {
        let model = IsingModel::from_parts([(0, -0.5)], [((0, 1), -1.0)]);
        let gs = ExactSolver::ground_state(&model).unwrap();
        assert_eq!(gs.energy, -1.5);
        assert_eq!(gs.assignments, vec![SpinAssignment::all_up(&[0, 1])]);
    }

    #[test]
    fn test_frustrated_triangle() {
        let model = IsingModel::from_parts([], [((0, 1), 1.0), ((1, 2), 1.0), ((0, 2), 1.0)]);
        let gs = ExactSolver::ground_state(&model).unwrap();
        assert_eq!(gs.energy, -1.0);
        assert_eq!(gs.degeneracy(), 6);
        assert!(!gs.truncated);
    }

    #[test]
    fn test_matches_brute_force_on_sparse_ids() {
        let model = IsingModel::from_parts(
            [(10, 0.3), (42, -0.2), (7, 0.1)],
            [((10, 42), -0.8), ((7, 42), 0.6), ((7, 10), 0.4)],
        );
        let gs = ExactSolver::ground_state(&model).unwrap();

        let vars = model.variables();
        let mut best = f64::INFINITY;
        for bits in 0..8u32 {
            let state = SpinAssignment::from_pairs(
                vars.iter()
                    .enumerate()
                    .map(|(i, &v)| (v, if (bits >> i) & 1 == 1 { 1 } else { -1 })),
            )
            .unwrap();
            best = best.min(model.energy(&state).unwrap());
        }
        assert!((gs.energy - best).abs() < 1e-12);
        for state in &gs.assignments {
            assert!((model.energy(state).unwrap() - best).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_empty_and_large() {
        assert!(matches!(
            ExactSolver::ground_state(&IsingModel::new()),
            Err(IrError::EmptyProblem)
        ));

        let chain = IsingModel::from_parts([], (0..30).map(|i| ((i, i + 1), -1.0)));
        assert!(matches!(
            ExactSolver::ground_state(&chain),
            Err(IrError::ProblemTooLarge { .. })
        ));
    }
}

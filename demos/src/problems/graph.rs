//! Qubit selection on a solver's working graph.

use std::collections::BTreeSet;

use petgraph::graphmap::UnGraphMap;
use petgraph::visit::Bfs;

use revanneal_hal::SolverProperties;
use revanneal_ir::NodeId;

use super::{ProblemError, ProblemResult};

/// Select `n` connected active qubits by breadth-first search.
///
/// The search starts at `seed_qubit`, or at each active qubit in index order
/// until one lies in a component with at least `n` qubits. The result is in
/// visiting order.
pub fn select_connected_qubits(
    properties: &SolverProperties,
    n: usize,
    seed_qubit: Option<NodeId>,
) -> ProblemResult<Vec<NodeId>> {
    if n == 0 {
        return Err(ProblemError::InvalidSize(n));
    }
    let graph = properties.working_graph();

    if let Some(seed) = seed_qubit {
        if !graph.contains_node(seed) {
            return Err(ProblemError::InactiveQubit(seed));
        }
        return bfs_from(&graph, seed, n).ok_or(ProblemError::NotEnoughQubits {
            requested: n,
            seed: Some(seed),
        });
    }

    let mut starts: Vec<NodeId> = graph.nodes().collect();
    starts.sort_unstable();
    let mut seen = BTreeSet::new();
    for start in starts {
        // A component that was already too small stays too small.
        if !seen.insert(start) {
            continue;
        }
        let mut bfs = Bfs::new(&graph, start);
        let mut component = Vec::new();
        while let Some(q) = bfs.next(&graph) {
            seen.insert(q);
            component.push(q);
        }
        if component.len() >= n {
            component.truncate(n);
            return Ok(component);
        }
    }

    Err(ProblemError::NotEnoughQubits {
        requested: n,
        seed: None,
    })
}

fn bfs_from(graph: &UnGraphMap<NodeId, ()>, start: NodeId, n: usize) -> Option<Vec<NodeId>> {
    let mut bfs = Bfs::new(graph, start);
    let mut chosen = Vec::with_capacity(n);
    while let Some(q) = bfs.next(graph) {
        chosen.push(q);
        if chosen.len() == n {
            return Some(chosen);
        }
    }
    None
}

/// Select a simple path of `n` active qubits, each consecutive pair joined
/// by an active coupler.
///
/// Walks greedily to the lowest-indexed unvisited neighbour, restarting from
/// each active qubit (or only from `seed_qubit`) until a walk reaches `n`.
pub fn select_path(
    properties: &SolverProperties,
    n: usize,
    seed_qubit: Option<NodeId>,
) -> ProblemResult<Vec<NodeId>> {
    if n == 0 {
        return Err(ProblemError::InvalidSize(n));
    }
    let graph = properties.working_graph();

    let starts: Vec<NodeId> = match seed_qubit {
        Some(seed) if !graph.contains_node(seed) => return Err(ProblemError::InactiveQubit(seed)),
        Some(seed) => vec![seed],
        None => {
            let mut all: Vec<NodeId> = graph.nodes().collect();
            all.sort_unstable();
            all
        }
    };

    for start in starts {
        let mut path = vec![start];
        let mut visited = BTreeSet::from([start]);
        while path.len() < n {
            let Some(&last) = path.last() else { break };
            let next = graph
                .neighbors(last)
                .filter(|q| !visited.contains(q))
                .min();
            match next {
                Some(q) => {
                    visited.insert(q);
                    path.push(q);
                }
                None => break,
            }
        }
        if path.len() == n {
            return Ok(path);
        }
    }

    Err(ProblemError::NotEnoughQubits {
        requested: n,
        seed: seed_qubit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3x3 grid, qubits 0..9, row-major, with qubit 4 inactive.
    fn grid_without_center() -> SolverProperties {
        let mut qubits = Vec::new();
        let mut couplers = Vec::new();
        for r in 0..3u32 {
            for c in 0..3u32 {
                let q = r * 3 + c;
                if q == 4 {
                    continue;
                }
                qubits.push(q);
                if c < 2 && q + 1 != 4 {
                    couplers.push([q, q + 1]);
                }
                if r < 2 && q + 3 != 4 {
                    couplers.push([q, q + 3]);
                }
            }
        }
        SolverProperties::from_graph(qubits, couplers)
    }

    fn is_connected(props: &SolverProperties, qubits: &[NodeId]) -> bool {
        let set: BTreeSet<NodeId> = qubits.iter().copied().collect();
        let mut reached = BTreeSet::from([qubits[0]]);
        let mut frontier = vec![qubits[0]];
        while let Some(q) = frontier.pop() {
            for &[a, b] in &props.couplers {
                let other = if a == q { b } else if b == q { a } else { continue };
                if set.contains(&other) && reached.insert(other) {
                    frontier.push(other);
                }
            }
        }
        reached.len() == set.len()
    }

    #[test]
    fn test_connected_selection() {
        let props = grid_without_center();
        for n in 1..=8 {
            let qubits = select_connected_qubits(&props, n, None).unwrap();
            assert_eq!(qubits.len(), n);
            assert!(is_connected(&props, &qubits));
        }
        let err = select_connected_qubits(&props, 9, None).unwrap_err();
        assert!(matches!(err, ProblemError::NotEnoughQubits { requested: 9, .. }));
    }

    #[test]
    fn test_seed_qubit() {
        let props = grid_without_center();
        let qubits = select_connected_qubits(&props, 3, Some(8)).unwrap();
        assert_eq!(qubits[0], 8);
        assert!(matches!(
            select_connected_qubits(&props, 3, Some(4)),
            Err(ProblemError::InactiveQubit(4))
        ));
    }

    #[test]
    fn test_path_follows_couplers() {
        let props = grid_without_center();
        let path = select_path(&props, 8, None).unwrap();
        assert_eq!(path.len(), 8);
        for pair in path.windows(2) {
            assert!(props.has_coupler(pair[0], pair[1]));
        }
        assert_eq!(path.iter().collect::<BTreeSet<_>>().len(), 8);
    }

    #[test]
    fn test_zero_size_rejected() {
        let props = grid_without_center();
        assert!(matches!(
            select_path(&props, 0, None),
            Err(ProblemError::InvalidSize(0))
        ));
    }
}

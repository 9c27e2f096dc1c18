//! Ising problem definition.
//!
//! An [`IsingModel`] holds linear biases `h_i` and pairwise couplings `J_ij`
//! keyed by solver qubit index:
//!
//! ```text
//! E(s) = offset + Σ_i h_i s_i + Σ_{i<j} J_ij s_i s_j,   s_i ∈ {-1, +1}
//! ```
//!
//! Coupling keys are normalized so that `u < v`. A coupling of a variable
//! with itself contributes `J s_i s_i = J` and is folded into the offset.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::sample::SpinAssignment;

/// Identifier of a problem variable (a solver qubit index).
pub type NodeId = u32;

/// QUBO coefficients keyed by `(u, v)` with `u <= v`; diagonal entries are
/// the linear terms.
pub type QuboCoefficients = BTreeMap<(NodeId, NodeId), f64>;

/// An Ising problem: biases, couplings and a constant offset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IsingModel {
    /// Linear biases.
    #[serde(default)]
    h: BTreeMap<NodeId, f64>,
    /// Pairwise couplings with `u < v`.
    #[serde(default, rename = "J", with = "coupling_list")]
    j: BTreeMap<(NodeId, NodeId), f64>,
    /// Constant energy offset.
    #[serde(default)]
    offset: f64,
}

fn ordered(u: NodeId, v: NodeId) -> (NodeId, NodeId) {
    if u < v { (u, v) } else { (v, u) }
}

impl IsingModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from bias and coupling iterators.
    ///
    /// Repeated entries accumulate.
    pub fn from_parts(
        h: impl IntoIterator<Item = (NodeId, f64)>,
        j: impl IntoIterator<Item = ((NodeId, NodeId), f64)>,
    ) -> Self {
        let mut model = Self::new();
        for (node, value) in h {
            model.add_bias(node, value);
        }
        for ((u, v), value) in j {
            model.add_coupling(u, v, value);
        }
        model
    }

    /// Set the constant offset.
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Add `value` to the bias on `node`.
    pub fn add_bias(&mut self, node: NodeId, value: f64) {
        *self.h.entry(node).or_insert(0.0) += value;
    }

    /// Overwrite the bias on `node`.
    pub fn set_bias(&mut self, node: NodeId, value: f64) {
        self.h.insert(node, value);
    }

    /// Add `value` to the coupling between `u` and `v`.
    pub fn add_coupling(&mut self, u: NodeId, v: NodeId, value: f64) {
        if u == v {
            self.offset += value;
            return;
        }
        *self.j.entry(ordered(u, v)).or_insert(0.0) += value;
    }

    /// Overwrite the coupling between `u` and `v`.
    ///
    /// A self-coupling has no entry to overwrite and is rejected; use
    /// [`add_coupling`](Self::add_coupling) to fold it into the offset.
    pub fn set_coupling(&mut self, u: NodeId, v: NodeId, value: f64) -> IrResult<()> {
        if u == v {
            return Err(IrError::SelfCoupling(u));
        }
        self.j.insert(ordered(u, v), value);
        Ok(())
    }

    /// Add to the constant offset, returning the new offset.
    pub fn add_offset(&mut self, value: f64) -> f64 {
        self.offset += value;
        self.offset
    }

    /// Bias on `node` (0 when absent).
    pub fn bias(&self, node: NodeId) -> f64 {
        self.h.get(&node).copied().unwrap_or(0.0)
    }

    /// Coupling between `u` and `v` in either orientation (0 when absent).
    pub fn coupling(&self, u: NodeId, v: NodeId) -> f64 {
        self.j.get(&ordered(u, v)).copied().unwrap_or(0.0)
    }

    /// Constant offset.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Iterate biases in node order.
    pub fn biases(&self) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.h.iter().map(|(&n, &v)| (n, v))
    }

    /// Iterate couplings in key order, `u < v`.
    pub fn couplings(&self) -> impl Iterator<Item = ((NodeId, NodeId), f64)> + '_ {
        self.j.iter().map(|(&k, &v)| (k, v))
    }

    /// Sorted list of every node that has a bias or takes part in a coupling.
    pub fn variables(&self) -> Vec<NodeId> {
        let mut vars: BTreeSet<NodeId> = self.h.keys().copied().collect();
        for &(u, v) in self.j.keys() {
            vars.insert(u);
            vars.insert(v);
        }
        vars.into_iter().collect()
    }

    /// Number of variables.
    pub fn num_variables(&self) -> usize {
        self.variables().len()
    }

    /// Number of couplings.
    pub fn num_interactions(&self) -> usize {
        self.j.len()
    }

    /// True if there are no biases and no couplings.
    pub fn is_empty(&self) -> bool {
        self.h.is_empty() && self.j.is_empty()
    }

    /// Neighbours of `node` with the coupling strength.
    pub fn neighbors(&self, node: NodeId) -> Vec<(NodeId, f64)> {
        self.j
            .iter()
            .filter_map(|(&(u, v), &value)| {
                if u == node {
                    Some((v, value))
                } else if v == node {
                    Some((u, value))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Energy of a spin assignment.
    ///
    /// Every problem variable must be present in `assignment`; extra spins
    /// are ignored.
    pub fn energy(&self, assignment: &SpinAssignment) -> IrResult<f64> {
        let spin = |node: NodeId| -> IrResult<f64> {
            assignment
                .get(node)
                .map(f64::from)
                .ok_or(IrError::MissingVariable(node))
        };

        let mut energy = self.offset;
        for (&node, &h) in &self.h {
            energy += h * spin(node)?;
        }
        for (&(u, v), &j) in &self.j {
            energy += j * spin(u)? * spin(v)?;
        }
        Ok(energy)
    }

    /// Energy change caused by flipping the spin on `node`.
    ///
    /// `ΔE = -2 s_i (h_i + Σ_j J_ij s_j)`.
    pub fn flip_energy_delta(&self, assignment: &SpinAssignment, node: NodeId) -> IrResult<f64> {
        let s_i = f64::from(assignment.get(node).ok_or(IrError::MissingVariable(node))?);
        let mut local_field = self.bias(node);
        for (other, j) in self.neighbors(node) {
            let s_j = assignment.get(other).ok_or(IrError::MissingVariable(other))?;
            local_field += j * f64::from(s_j);
        }
        Ok(-2.0 * s_i * local_field)
    }

    /// Check that every coefficient is finite.
    pub fn validate(&self) -> IrResult<()> {
        if !self.offset.is_finite() {
            return Err(IrError::NonFiniteCoefficient("offset".into()));
        }
        if let Some((node, value)) = self.h.iter().find(|(_, v)| !v.is_finite()) {
            return Err(IrError::NonFiniteCoefficient(format!("h[{node}] = {value}")));
        }
        if let Some(((u, v), value)) = self.j.iter().find(|(_, v)| !v.is_finite()) {
            return Err(IrError::NonFiniteCoefficient(format!("J[{u},{v}] = {value}")));
        }
        Ok(())
    }

    /// Largest absolute bias (0 for an unbiased problem).
    pub fn max_abs_bias(&self) -> f64 {
        self.h.values().fold(0.0, |acc, v| acc.max(v.abs()))
    }

    /// Largest absolute coupling (0 for an uncoupled problem).
    pub fn max_abs_coupling(&self) -> f64 {
        self.j.values().fold(0.0, |acc, v| acc.max(v.abs()))
    }

    /// Multiply every coefficient, offset included, by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            h: self.h.iter().map(|(&n, &v)| (n, v * factor)).collect(),
            j: self.j.iter().map(|(&k, &v)| (k, v * factor)).collect(),
            offset: self.offset * factor,
        }
    }

    /// Convert QUBO coefficients over `x ∈ {0, 1}` using `x = (s + 1) / 2`.
    pub fn from_qubo(qubo: &QuboCoefficients, qubo_offset: f64) -> Self {
        let mut model = Self::new().with_offset(qubo_offset);
        for (&(u, v), &q) in qubo {
            if u == v {
                model.add_bias(u, q / 2.0);
                model.offset += q / 2.0;
            } else {
                model.add_coupling(u, v, q / 4.0);
                model.add_bias(u, q / 4.0);
                model.add_bias(v, q / 4.0);
                model.offset += q / 4.0;
            }
        }
        model
    }

    /// Convert to QUBO coefficients using `s = 2x - 1`.
    ///
    /// Returns the coefficients and the QUBO offset.
    pub fn to_qubo(&self) -> (QuboCoefficients, f64) {
        let mut qubo = QuboCoefficients::new();
        let mut offset = self.offset;

        for (&node, &h) in &self.h {
            *qubo.entry((node, node)).or_insert(0.0) += 2.0 * h;
            offset -= h;
        }
        for (&(u, v), &j) in &self.j {
            *qubo.entry((u, v)).or_insert(0.0) += 4.0 * j;
            *qubo.entry((u, u)).or_insert(0.0) -= 2.0 * j;
            *qubo.entry((v, v)).or_insert(0.0) -= 2.0 * j;
            offset += j;
        }
        (qubo, offset)
    }
}

impl fmt::Display for IsingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Ising model ({} variables, {} couplings):",
            self.num_variables(),
            self.num_interactions()
        )?;
        for (node, h) in self.biases().filter(|(_, h)| *h != 0.0) {
            writeln!(f, "  h[{node}] = {h:+.3}")?;
        }
        for ((u, v), j) in self.couplings() {
            writeln!(f, "  J[{u},{v}] = {j:+.3}")?;
        }
        Ok(())
    }
}

/// Couplings serialize as a list of `[u, v, value]` triples since JSON
/// objects cannot carry tuple keys.
mod coupling_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer, ser::SerializeSeq};

    use super::{NodeId, ordered};

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<(NodeId, NodeId), f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(map.len()))?;
        for (&(u, v), &value) in map {
            seq.serialize_element(&(u, v, value))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<(NodeId, NodeId), f64>, D::Error> {
        let triples: Vec<(NodeId, NodeId, f64)> = Vec::deserialize(deserializer)?;
        let mut map = BTreeMap::new();
        for (u, v, value) in triples {
            if u == v {
                return Err(serde::de::Error::custom(format!(
                    "self-coupling on variable {u}"
                )));
            }
            *map.entry(ordered(u, v)).or_insert(0.0) += value;
        }
        Ok(map)
    }
}

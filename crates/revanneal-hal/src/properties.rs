//! Solver property introspection.
//!
//! [`SolverProperties`] mirrors the property document a remote annealer
//! publishes: its working graph (active qubits and couplers), coefficient
//! ranges, timing limits and the parameter names it accepts. Problems and
//! schedules are checked against it before submission.
//!
//! All couplers are undirected: `[a, b]` and `[b, a]` name the same coupler.

use std::collections::BTreeMap;

use petgraph::graphmap::UnGraphMap;
use revanneal_ir::{NodeId, ScheduleLimits};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Parameters a solver must accept for reverse annealing.
pub const REVERSE_ANNEAL_PARAMETERS: [&str; 3] =
    ["anneal_schedule", "initial_state", "reinitialize_state"];

fn default_h_range() -> [f64; 2] {
    [-4.0, 4.0]
}

fn default_j_range() -> [f64; 2] {
    [-1.0, 1.0]
}

fn default_annealing_time_range() -> [f64; 2] {
    [0.5, 2000.0]
}

fn default_annealing_time() -> f64 {
    20.0
}

fn default_max_schedule_points() -> usize {
    12
}

fn default_num_reads_range() -> [u32; 2] {
    [1, 10_000]
}

/// Processor topology descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    /// Topology family, e.g. `"pegasus"`, `"zephyr"`, `"chimera"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Family-specific shape parameters.
    #[serde(default)]
    pub shape: Vec<u32>,
}

/// Properties published by a remote solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverProperties {
    /// Total qubit count, including inactive qubits.
    #[serde(default)]
    pub num_qubits: u32,
    /// Active (working) qubits.
    #[serde(default)]
    pub qubits: Vec<NodeId>,
    /// Active couplers.
    #[serde(default)]
    pub couplers: Vec<[NodeId; 2]>,
    /// Allowed bias range.
    #[serde(default = "default_h_range")]
    pub h_range: [f64; 2],
    /// Allowed coupling range.
    #[serde(default = "default_j_range")]
    pub j_range: [f64; 2],
    /// Extended coupling range, if the solver offers one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_j_range: Option<[f64; 2]>,
    /// Allowed anneal durations in µs.
    #[serde(default = "default_annealing_time_range")]
    pub annealing_time_range: [f64; 2],
    /// Anneal duration used when none is given, µs.
    #[serde(default = "default_annealing_time")]
    pub default_annealing_time: f64,
    /// Maximum number of schedule breakpoints.
    #[serde(default = "default_max_schedule_points")]
    pub max_anneal_schedule_points: usize,
    /// Allowed `num_reads`.
    #[serde(default = "default_num_reads_range")]
    pub num_reads_range: [u32; 2],
    /// Allowed total run duration in µs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_run_duration_range: Option<[f64; 2]>,
    /// Accepted parameter names with their documentation strings.
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    /// Processor identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chip_id: Option<String>,
    /// Processor topology.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<Topology>,
    /// Per-qubit anneal offset ranges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anneal_offset_ranges: Vec<[f64; 2]>,
    /// Solver category, e.g. `"qpu"` or `"hybrid"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Any property this crate does not model.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for SolverProperties {
    fn default() -> Self {
        Self {
            num_qubits: 0,
            qubits: Vec::new(),
            couplers: Vec::new(),
            h_range: default_h_range(),
            j_range: default_j_range(),
            extended_j_range: None,
            annealing_time_range: default_annealing_time_range(),
            default_annealing_time: default_annealing_time(),
            max_anneal_schedule_points: default_max_schedule_points(),
            num_reads_range: default_num_reads_range(),
            problem_run_duration_range: None,
            parameters: BTreeMap::new(),
            chip_id: None,
            topology: None,
            anneal_offset_ranges: Vec::new(),
            category: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl SolverProperties {
    /// Properties for a working graph; other fields take their defaults.
    ///
    /// `num_qubits` is one past the largest qubit index.
    pub fn from_graph(qubits: Vec<NodeId>, couplers: Vec<[NodeId; 2]>) -> Self {
        let num_qubits = qubits.iter().max().map_or(0, |&q| q + 1);
        Self {
            num_qubits,
            qubits,
            couplers,
            category: Some("qpu".into()),
            ..Self::default()
        }
    }

    /// Declare accepted parameter names.
    pub fn with_parameters<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        for name in names {
            self.parameters
                .insert(name.to_string(), serde_json::Value::String(String::new()));
        }
        self
    }

    /// Whether `qubit` is active.
    pub fn has_qubit(&self, qubit: NodeId) -> bool {
        self.qubits.contains(&qubit)
    }

    /// Whether the coupler `(u, v)` is active, in either orientation.
    pub fn has_coupler(&self, u: NodeId, v: NodeId) -> bool {
        self.couplers
            .iter()
            .any(|&[a, b]| (a == u && b == v) || (a == v && b == u))
    }

    /// Active qubits as a set.
    pub fn qubit_set(&self) -> FxHashSet<NodeId> {
        self.qubits.iter().copied().collect()
    }

    /// Active couplers as a set of ordered `(low, high)` pairs.
    pub fn coupler_set(&self) -> FxHashSet<(NodeId, NodeId)> {
        self.couplers
            .iter()
            .map(|&[a, b]| if a < b { (a, b) } else { (b, a) })
            .collect()
    }

    /// Working graph: active qubits as nodes, active couplers as edges.
    pub fn working_graph(&self) -> UnGraphMap<NodeId, ()> {
        let mut graph = UnGraphMap::with_capacity(self.qubits.len(), self.couplers.len());
        for &q in &self.qubits {
            graph.add_node(q);
        }
        for &[a, b] in &self.couplers {
            graph.add_edge(a, b, ());
        }
        graph
    }

    /// Whether the solver lists `name` among its parameters.
    pub fn supports_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// Whether every reverse-anneal parameter is accepted.
    pub fn supports_reverse_anneal(&self) -> bool {
        REVERSE_ANNEAL_PARAMETERS
            .iter()
            .all(|p| self.supports_parameter(p))
    }

    /// Schedule constraints derived from the timing properties.
    pub fn schedule_limits(&self) -> ScheduleLimits {
        ScheduleLimits {
            max_points: self.max_anneal_schedule_points,
            min_anneal_time_us: self.annealing_time_range[0],
            max_anneal_time_us: self.annealing_time_range[1],
        }
    }

    /// Fraction of the nominal qubits that are working.
    pub fn yield_fraction(&self) -> f64 {
        if self.num_qubits == 0 {
            0.0
        } else {
            self.qubits.len() as f64 / f64::from(self.num_qubits)
        }
    }

    /// Human-readable key/value lines.
    pub fn summary(&self) -> Vec<(String, String)> {
        let mut lines = vec![
            ("Qubits".to_string(), format!(
                "{} working of {} ({:.1}%)",
                self.qubits.len(),
                self.num_qubits,
                self.yield_fraction() * 100.0
            )),
            ("Couplers".to_string(), self.couplers.len().to_string()),
            ("h range".to_string(), format!("{:?}", self.h_range)),
            ("J range".to_string(), format!("{:?}", self.j_range)),
            (
                "Annealing time range (µs)".to_string(),
                format!("{:?}", self.annealing_time_range),
            ),
            (
                "Default annealing time (µs)".to_string(),
                self.default_annealing_time.to_string(),
            ),
            (
                "Max schedule points".to_string(),
                self.max_anneal_schedule_points.to_string(),
            ),
            ("num_reads range".to_string(), format!("{:?}", self.num_reads_range)),
            (
                "Reverse annealing".to_string(),
                if self.supports_reverse_anneal() { "supported" } else { "not supported" }
                    .to_string(),
            ),
        ];
        if let Some(ref chip) = self.chip_id {
            lines.insert(0, ("Chip".to_string(), chip.clone()));
        }
        if let Some(ref topology) = self.topology {
            lines.push(("Topology".to_string(), format!("{} {:?}", topology.kind, topology.shape)));
        }
        lines
    }
}

/// A solver as listed by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverInfo {
    /// Solver identifier.
    pub id: String,
    /// Status, e.g. `"ONLINE"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Average load, 0 to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_load: Option<f64>,
    /// Published properties.
    #[serde(default)]
    pub properties: SolverProperties,
}

impl SolverInfo {
    /// Whether the solver accepts problems. A missing status counts as online.
    pub fn is_online(&self) -> bool {
        self.status
            .as_deref()
            .is_none_or(|s| s.eq_ignore_ascii_case("online"))
    }

    /// Whether the solver is a quantum processor.
    pub fn is_qpu(&self) -> bool {
        match self.properties.category.as_deref() {
            Some(category) => category.eq_ignore_ascii_case("qpu"),
            None => !self.properties.qubits.is_empty() && !self.properties.couplers.is_empty(),
        }
    }
}

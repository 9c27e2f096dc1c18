//! Spin assignments and sample sets returned by a sampler.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::ising::NodeId;

/// A single spin, `+1` or `-1`.
pub type Spin = i8;

/// Spins keyed by variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<NodeId, Spin>", into = "BTreeMap<NodeId, Spin>")]
pub struct SpinAssignment(BTreeMap<NodeId, Spin>);

impl TryFrom<BTreeMap<NodeId, Spin>> for SpinAssignment {
    type Error = IrError;

    fn try_from(map: BTreeMap<NodeId, Spin>) -> IrResult<Self> {
        for (&node, &value) in &map {
            check_spin(node, value)?;
        }
        Ok(Self(map))
    }
}

impl From<SpinAssignment> for BTreeMap<NodeId, Spin> {
    fn from(assignment: SpinAssignment) -> Self {
        assignment.0
    }
}

fn check_spin(node: NodeId, value: Spin) -> IrResult<Spin> {
    if value == 1 || value == -1 {
        Ok(value)
    } else {
        Err(IrError::InvalidSpin { node, value })
    }
}

impl SpinAssignment {
    /// Create an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an assignment from `(variable, spin)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (NodeId, Spin)>) -> IrResult<Self> {
        let mut map = BTreeMap::new();
        for (node, value) in pairs {
            map.insert(node, check_spin(node, value)?);
        }
        Ok(Self(map))
    }

    /// Every variable in `vars` set to `+1`.
    pub fn all_up(vars: &[NodeId]) -> Self {
        Self(vars.iter().map(|&n| (n, 1)).collect())
    }

    /// Spin of `node`, if assigned.
    pub fn get(&self, node: NodeId) -> Option<Spin> {
        self.0.get(&node).copied()
    }

    /// Assign a spin.
    pub fn set(&mut self, node: NodeId, value: Spin) -> IrResult<()> {
        self.0.insert(node, check_spin(node, value)?);
        Ok(())
    }

    /// Copy with the spin on `node` flipped. Unassigned nodes are left alone.
    pub fn flipped(&self, node: NodeId) -> Self {
        let mut copy = self.clone();
        if let Some(s) = copy.0.get_mut(&node) {
            *s = -*s;
        }
        copy
    }

    /// Iterate `(variable, spin)` in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Spin)> + '_ {
        self.0.iter().map(|(&n, &s)| (n, s))
    }

    /// Assigned variables in order.
    pub fn variables(&self) -> Vec<NodeId> {
        self.0.keys().copied().collect()
    }

    /// Number of assigned variables.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if nothing is assigned.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of variables whose spins differ.
    ///
    /// Both assignments must cover the same variables.
    pub fn hamming_distance(&self, other: &Self) -> IrResult<usize> {
        if self.0.len() != other.0.len() || !self.0.keys().eq(other.0.keys()) {
            return Err(IrError::VariableMismatch {
                left: self.0.len(),
                right: other.0.len(),
            });
        }
        Ok(self
            .0
            .values()
            .zip(other.0.values())
            .filter(|(a, b)| a != b)
            .count())
    }
}

impl fmt::Display for SpinAssignment {
    /// Renders spins in variable order as `+` / `-`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &s in self.0.values() {
            f.write_str(if s > 0 { "+" } else { "-" })?;
        }
        Ok(())
    }
}

/// How the sampler reports reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// One record per read, in read order.
    Raw,
    /// Identical reads aggregated with an occurrence count.
    #[default]
    Histogram,
}

impl AnswerMode {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerMode::Raw => "raw",
            AnswerMode::Histogram => "histogram",
        }
    }
}

/// One distinct sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// The spin assignment.
    pub sample: SpinAssignment,
    /// Energy reported for the sample.
    pub energy: f64,
    /// Number of reads that produced this sample.
    pub num_occurrences: u32,
}

/// Timing information reported by the sampler, in microseconds.
pub type Timing = BTreeMap<String, f64>;

/// Result of one sampling request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    /// Variables covered by every sample, in order.
    pub variables: Vec<NodeId>,
    /// Records in the order the sampler returned them.
    pub records: Vec<SampleRecord>,
    /// Sampler timing breakdown.
    #[serde(default)]
    pub timing: Timing,
    /// Answer mode the records were produced with.
    #[serde(default)]
    pub answer_mode: AnswerMode,
    /// Remote problem identifier, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_id: Option<String>,
}

impl SampleSet {
    /// Create an empty sample set over `variables`.
    pub fn new(variables: Vec<NodeId>, answer_mode: AnswerMode) -> Self {
        Self {
            variables,
            records: Vec::new(),
            timing: Timing::new(),
            answer_mode,
            problem_id: None,
        }
    }

    /// Build a raw-mode sample set, one record per read.
    pub fn from_reads(
        variables: Vec<NodeId>,
        reads: impl IntoIterator<Item = (SpinAssignment, f64)>,
    ) -> Self {
        let mut set = Self::new(variables, AnswerMode::Raw);
        for (sample, energy) in reads {
            set.push(SampleRecord {
                sample,
                energy,
                num_occurrences: 1,
            });
        }
        set
    }

    /// Attach timing information.
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Attach the remote problem id.
    pub fn with_problem_id(mut self, id: impl Into<String>) -> Self {
        self.problem_id = Some(id.into());
        self
    }

    /// Append a record.
    pub fn push(&mut self, record: SampleRecord) {
        self.records.push(record);
    }

    /// Number of records (distinct samples in histogram mode).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of reads.
    pub fn total_reads(&self) -> u64 {
        self.records.iter().map(|r| u64::from(r.num_occurrences)).sum()
    }

    /// Lowest-energy record; the first one wins on ties.
    pub fn lowest(&self) -> Option<&SampleRecord> {
        self.records.iter().fold(None, |best: Option<&SampleRecord>, r| match best {
            Some(b) if b.energy <= r.energy => Some(b),
            _ => Some(r),
        })
    }

    /// Energy of every read, occurrences expanded, in record order.
    pub fn energies_expanded(&self) -> Vec<f64> {
        self.records
            .iter()
            .flat_map(|r| std::iter::repeat_n(r.energy, r.num_occurrences as usize))
            .collect()
    }

    /// Assignment of every read, occurrences expanded, in record order.
    pub fn samples_expanded(&self) -> Vec<&SpinAssignment> {
        self.records
            .iter()
            .flat_map(|r| std::iter::repeat_n(&r.sample, r.num_occurrences as usize))
            .collect()
    }

    /// Merge identical assignments, keeping first-seen order.
    pub fn aggregate(&self) -> Self {
        let mut index: FxHashMap<&SpinAssignment, usize> = FxHashMap::default();
        let mut records: Vec<SampleRecord> = Vec::new();

        for record in &self.records {
            if let Some(&i) = index.get(&record.sample) {
                records[i].num_occurrences += record.num_occurrences;
            } else {
                index.insert(&record.sample, records.len());
                records.push(record.clone());
            }
        }

        Self {
            variables: self.variables.clone(),
            records,
            timing: self.timing.clone(),
            answer_mode: AnswerMode::Histogram,
            problem_id: self.problem_id.clone(),
        }
    }

    /// Copy with records sorted by ascending energy (stable).
    pub fn sorted_by_energy(&self) -> Self {
        let mut sorted = self.clone();
        sorted.records.sort_by(|a, b| a.energy.total_cmp(&b.energy));
        sorted
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> IrResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every record covers exactly [`variables`](Self::variables).
    pub fn validate(&self) -> IrResult<()> {
        for (index, record) in self.records.iter().enumerate() {
            let sample = &record.sample;
            if sample.len() != self.variables.len()
                || !self.variables.iter().all(|v| sample.0.contains_key(v))
            {
                return Err(IrError::RecordMismatch {
                    index,
                    expected: self.variables.len(),
                    found: sample.len(),
                });
            }
        }
        Ok(())
    }

    /// Parse from JSON and [`validate`](Self::validate).
    pub fn from_json(json: &str) -> IrResult<Self> {
        let set: Self = serde_json::from_str(json)?;
        set.validate()?;
        Ok(set)
    }
}

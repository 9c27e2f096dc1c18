//! Per-run summaries and s-target sweeps.

use revanneal_ir::{SampleSet, SpinAssignment, Timing};
use serde::{Deserialize, Serialize};

use crate::energy::{EnergyStats, ground_state_ratio};
use crate::error::StatsResult;
use crate::hamming::{hamming_from, hamming_series, mean_distance};

/// Everything reported for one sample set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run label, e.g. `"forward"` or `"reverse (reinitialize)"`.
    pub label: String,
    /// Energy statistics over all reads.
    pub stats: EnergyStats,
    /// Reference ground energy, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_energy: Option<f64>,
    /// Fraction of reads at the ground energy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_state_ratio: Option<f64>,
    /// Energy of every read, in read order.
    pub energies: Vec<f64>,
    /// Distance between consecutive reads.
    pub hamming_consecutive: Vec<usize>,
    /// Distance of every read from the reverse-anneal initial state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hamming_from_initial: Option<Vec<usize>>,
    /// Sampler timing, µs.
    #[serde(default)]
    pub timing: Timing,
}

impl RunSummary {
    /// Summarise `set`.
    ///
    /// `initial` adds distances from the starting state; `ground_energy`
    /// adds the ground-state ratio at the given tolerance.
    pub fn from_sampleset(
        label: impl Into<String>,
        set: &SampleSet,
        initial: Option<&SpinAssignment>,
        ground_energy: Option<f64>,
        tolerance: f64,
    ) -> StatsResult<Self> {
        let energies = set.energies_expanded();
        let stats = EnergyStats::from_energies(&energies)?;
        let samples = set.samples_expanded();
        let hamming_consecutive = hamming_series(&samples)?;
        let hamming_from_initial = initial
            .map(|reference| hamming_from(reference, &samples))
            .transpose()?;

        Ok(Self {
            label: label.into(),
            stats,
            ground_energy,
            ground_state_ratio: ground_energy.map(|g| ground_state_ratio(set, g, tolerance)),
            energies,
            hamming_consecutive,
            hamming_from_initial,
            timing: set.timing.clone(),
        })
    }

    /// Mean distance between consecutive reads.
    pub fn mean_hamming_consecutive(&self) -> Option<f64> {
        mean_distance(&self.hamming_consecutive)
    }

    /// Mean distance from the initial state.
    pub fn mean_hamming_from_initial(&self) -> Option<f64> {
        self.hamming_from_initial.as_deref().and_then(mean_distance)
    }

    /// Distance series to plot: from the initial state when known.
    pub fn hamming_for_plot(&self) -> &[usize] {
        self.hamming_from_initial
            .as_deref()
            .unwrap_or(&self.hamming_consecutive)
    }

    /// Key/value lines for printing.
    pub fn report_lines(&self) -> Vec<(String, String)> {
        let mut lines = vec![
            ("Reads".to_string(), self.stats.count.to_string()),
            ("Lowest energy".to_string(), format!("{:.4}", self.stats.lowest)),
            ("Mean energy".to_string(), format!("{:.4}", self.stats.mean)),
            ("Energy stdev".to_string(), format!("{:.4}", self.stats.stdev)),
        ];
        if let Some(ground) = self.ground_energy {
            lines.push(("Ground energy".to_string(), format!("{ground:.4}")));
        }
        if let Some(ratio) = self.ground_state_ratio {
            lines.push(("Ground-state ratio".to_string(), format!("{:.1}%", ratio * 100.0)));
        }
        if let Some(mean) = self.mean_hamming_consecutive() {
            lines.push(("Mean Hamming (consecutive)".to_string(), format!("{mean:.2}")));
        }
        if let Some(mean) = self.mean_hamming_from_initial() {
            lines.push(("Mean Hamming (from initial)".to_string(), format!("{mean:.2}")));
        }
        if let Some(access) = self.timing.get("qpu_access_time") {
            lines.push(("QPU access time (µs)".to_string(), format!("{access:.0}")));
        }
        lines
    }
}

/// One point of an s-target sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    /// Anneal fraction reversed to.
    pub s_target: f64,
    /// Ground-state ratio at this target.
    pub ratio: f64,
    /// Energy statistics at this target.
    pub stats: EnergyStats,
    /// Mean distance from the initial state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_hamming_from_initial: Option<f64>,
}

impl SweepPoint {
    /// Point from a run summary; a missing ratio counts as 0.
    pub fn from_summary(s_target: f64, summary: &RunSummary) -> Self {
        Self {
            s_target,
            ratio: summary.ground_state_ratio.unwrap_or(0.0),
            stats: summary.stats,
            mean_hamming_from_initial: summary.mean_hamming_from_initial(),
        }
    }
}

/// Result of a reverse anneal repeated over several `s_target` values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    /// Ground energy the ratios refer to.
    pub ground_energy: f64,
    /// Whether reads were reinitialized from the initial state.
    pub reinitialize_state: bool,
    /// Points in sweep order.
    pub points: Vec<SweepPoint>,
}

impl SweepResult {
    /// Empty sweep.
    pub fn new(ground_energy: f64, reinitialize_state: bool) -> Self {
        Self {
            ground_energy,
            reinitialize_state,
            points: Vec::new(),
        }
    }

    /// Append a point.
    pub fn push(&mut self, point: SweepPoint) {
        self.points.push(point);
    }

    /// Point with the highest ground-state ratio; the earliest wins ties.
    pub fn best(&self) -> Option<&SweepPoint> {
        self.points.iter().fold(None, |best: Option<&SweepPoint>, p| match best {
            Some(b) if b.ratio >= p.ratio => Some(b),
            _ => Some(p),
        })
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> StatsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::DEFAULT_GROUND_TOLERANCE;

    fn spins(values: &[i8]) -> SpinAssignment {
        SpinAssignment::from_pairs(values.iter().enumerate().map(|(i, &s)| (i as u32, s))).unwrap()
    }

    fn raw_set() -> SampleSet {
        SampleSet::from_reads(
            vec![0, 1],
            [
                (spins(&[1, 1]), -1.0),
                (spins(&[1, -1]), 1.0),
                (spins(&[1, 1]), -1.0),
                (spins(&[-1, -1]), -1.0),
            ],
        )
    }

    #[test]
    fn test_summary_of_reverse_run() {
        let initial = spins(&[1, 1]);
        let summary = RunSummary::from_sampleset(
            "reverse",
            &raw_set(),
            Some(&initial),
            Some(-1.0),
            DEFAULT_GROUND_TOLERANCE,
        )
        .unwrap();

        assert_eq!(summary.stats.count, 4);
        assert_eq!(summary.ground_state_ratio, Some(0.75));
        assert_eq!(summary.hamming_consecutive, vec![1, 1, 2]);
        assert_eq!(summary.hamming_from_initial, Some(vec![0, 1, 0, 2]));
        assert_eq!(summary.hamming_for_plot(), &[0, 1, 0, 2]);
        assert_eq!(summary.mean_hamming_from_initial(), Some(0.75));
        assert!(summary.report_lines().iter().any(|(k, v)| k == "Ground-state ratio" && v == "75.0%"));
    }

    #[test]
    fn test_summary_without_reference() {
        let summary =
            RunSummary::from_sampleset("forward", &raw_set(), None, None, DEFAULT_GROUND_TOLERANCE).unwrap();
        assert!(summary.ground_state_ratio.is_none());
        assert_eq!(summary.hamming_for_plot(), &[1, 1, 2]);
    }

    #[test]
    fn test_sweep_best_prefers_first_on_ties() {
        let stats = EnergyStats::from_energies(&[-1.0]).unwrap();
        let mut sweep = SweepResult::new(-1.0, true);
        assert!(sweep.best().is_none());
        for (s, ratio) in [(0.3, 0.2), (0.4, 0.9), (0.5, 0.9), (0.6, 0.1)] {
            sweep.push(SweepPoint {
                s_target: s,
                ratio,
                stats,
                mean_hamming_from_initial: None,
            });
        }
        assert_eq!(sweep.best().unwrap().s_target, 0.4);

        let json = sweep.to_json().unwrap();
        let back: SweepResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.points.len(), 4);
    }
}

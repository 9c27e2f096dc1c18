//! Energy statistics over reads.

use revanneal_ir::SampleSet;
use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};

/// Default tolerance when matching an energy against the ground energy.
pub const DEFAULT_GROUND_TOLERANCE: f64 = 1e-6;

/// Lowest, mean and spread of the energies of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyStats {
    /// Minimum energy.
    pub lowest: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub stdev: f64,
    /// Number of reads.
    pub count: usize,
}

impl EnergyStats {
    /// Statistics of a list of energies, one per read.
    pub fn from_energies(energies: &[f64]) -> StatsResult<Self> {
        if energies.is_empty() {
            return Err(StatsError::Empty);
        }
        let count = energies.len();
        let n = count as f64;
        let lowest = energies.iter().copied().fold(f64::INFINITY, f64::min);
        let mean = energies.iter().sum::<f64>() / n;
        let variance = energies.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n;
        Ok(Self {
            lowest,
            mean,
            stdev: variance.sqrt(),
            count,
        })
    }

    /// Statistics over every read of `set`, expanding occurrence counts.
    pub fn from_sampleset(set: &SampleSet) -> StatsResult<Self> {
        Self::from_energies(&set.energies_expanded())
    }
}

/// Fraction of reads whose energy is within `tolerance` of `ground_energy`.
///
/// Returns 0 for a set with no reads.
pub fn ground_state_ratio(set: &SampleSet, ground_energy: f64, tolerance: f64) -> f64 {
    let total = set.total_reads();
    if total == 0 {
        return 0.0;
    }
    let hits: u64 = set
        .records
        .iter()
        .filter(|r| (r.energy - ground_energy).abs() <= tolerance)
        .map(|r| u64::from(r.num_occurrences))
        .sum();
    hits as f64 / total as f64
}

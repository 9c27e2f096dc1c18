//! Hamming distances between samples.

use revanneal_ir::SpinAssignment;

use crate::error::StatsResult;

/// Distance between each pair of consecutive samples.
///
/// Yields `len - 1` values, none for fewer than two samples.
pub fn hamming_series(samples: &[&SpinAssignment]) -> StatsResult<Vec<usize>> {
    samples
        .windows(2)
        .map(|pair| Ok(pair[0].hamming_distance(pair[1])?))
        .collect()
}

/// Distance of each sample from `reference`.
pub fn hamming_from(reference: &SpinAssignment, samples: &[&SpinAssignment]) -> StatsResult<Vec<usize>> {
    samples
        .iter()
        .map(|s| Ok(reference.hamming_distance(s)?))
        .collect()
}

/// Mean of a distance series; `None` when empty.
pub fn mean_distance(distances: &[usize]) -> Option<f64> {
    if distances.is_empty() {
        None
    } else {
        Some(distances.iter().sum::<usize>() as f64 / distances.len() as f64)
    }
}

//! revanneal statistics
//!
//! Descriptive statistics of annealing runs:
//!
//! - [`EnergyStats`]: lowest, mean and population standard deviation of
//!   the energy over all reads
//! - [`hamming_series`] / [`hamming_from`]: how far reads move, between
//!   consecutive reads or from the reverse-anneal initial state
//! - [`ground_state_ratio`]: fraction of reads at the ground energy
//! - [`RunSummary`] and [`SweepResult`] bundling the above for reporting
//! - [`plot`]: SVG charts of runs and sweeps
//!
//! # Example
//!
//! ```rust
//! use revanneal_ir::{SampleSet, SpinAssignment};
//! use revanneal_stats::{DEFAULT_GROUND_TOLERANCE, RunSummary};
//!
//! let up = SpinAssignment::all_up(&[0, 1]);
//! let set = SampleSet::from_reads(vec![0, 1], [(up.clone(), -1.0), (up.clone(), -1.0)]);
//!
//! let summary = RunSummary::from_sampleset("reverse", &set, Some(&up), Some(-1.0), DEFAULT_GROUND_TOLERANCE).unwrap();
//! assert_eq!(summary.ground_state_ratio, Some(1.0));
//! assert_eq!(summary.hamming_from_initial, Some(vec![0, 0]));
//! ```

pub mod energy;
pub mod error;
pub mod hamming;
pub mod plot;
pub mod summary;

pub use energy::{DEFAULT_GROUND_TOLERANCE, EnergyStats, ground_state_ratio};
pub use error::{StatsError, StatsResult};
pub use hamming::{hamming_from, hamming_series, mean_distance};
pub use plot::{plot_energy_and_hamming, plot_sweep};
pub use summary::{RunSummary, SweepPoint, SweepResult};

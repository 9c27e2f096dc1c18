//! Reverse anneals over a range of `s_target` values.

use indicatif::ProgressBar;
use tracing::info;

use revanneal_hal::Sampler;
use revanneal_ir::{IsingModel, ReverseScheduleSpec, SpinAssignment};
use revanneal_stats::{DEFAULT_GROUND_TOLERANCE, RunSummary, SweepPoint, SweepResult};

use super::reverse::{ReverseAnnealExperiment, ground_reference};
use super::{GroundReference, RunnerError, RunnerResult};

/// Sweep of reverse anneals from one initial state.
///
/// Each `s_target` gets one reverse anneal; the ground-state ratio of every
/// run is measured against the exact ground energy when the problem is
/// small enough, else against the initial state's energy.
#[derive(Debug, Clone)]
pub struct SweepRunner {
    /// Target values, in submission order.
    pub s_targets: Vec<f64>,
    /// Geometry shared by every point; `s_target` is overwritten.
    pub schedule: ReverseScheduleSpec,
    /// Reads per point.
    pub num_reads: u32,
    /// Restart from the initial state on every read.
    pub reinitialize_state: bool,
    /// Energy tolerance for counting ground-state hits.
    pub tolerance: f64,
    /// Enumerate the ground state when the problem is small enough.
    pub exact: bool,
}

impl SweepRunner {
    /// Sweep over `s_targets` with 100 reads per point.
    pub fn new(s_targets: Vec<f64>) -> Self {
        Self {
            s_targets,
            schedule: ReverseScheduleSpec::default(),
            num_reads: 100,
            reinitialize_state: true,
            tolerance: DEFAULT_GROUND_TOLERANCE,
            exact: true,
        }
    }

    /// Evenly spaced targets from `start` to `stop` inclusive.
    pub fn linspace(start: f64, stop: f64, points: usize) -> Vec<f64> {
        match points {
            0 => Vec::new(),
            1 => vec![start],
            n => (0..n)
                .map(|i| start + (stop - start) * i as f64 / (n - 1) as f64)
                .map(|s| (s * 1e6).round() / 1e6)
                .collect(),
        }
    }

    /// Set the reads per point.
    pub fn with_num_reads(mut self, num_reads: u32) -> Self {
        self.num_reads = num_reads;
        self
    }

    /// Set the shared schedule geometry.
    pub fn with_schedule(mut self, schedule: ReverseScheduleSpec) -> Self {
        self.schedule = schedule;
        self
    }

    /// Set `reinitialize_state` for every point.
    pub fn with_reinitialize(mut self, reinitialize_state: bool) -> Self {
        self.reinitialize_state = reinitialize_state;
        self
    }

    /// Set the ground-state tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Skip exact enumeration.
    pub fn without_exact(mut self) -> Self {
        self.exact = false;
        self
    }

    /// Run the sweep from `initial_state`, ticking `progress` once per point.
    pub async fn run<S: Sampler + ?Sized>(
        &self,
        sampler: &S,
        model: &IsingModel,
        initial_state: &SpinAssignment,
        progress: Option<&ProgressBar>,
    ) -> RunnerResult<SweepResult> {
        if self.s_targets.is_empty() {
            return Err(RunnerError::NoTargets);
        }

        let initial_energy = model.energy(initial_state)?;
        let (ground_energy, reference) = ground_reference(model, self.exact, initial_energy)?;
        if reference == GroundReference::Observed {
            info!("sweep ratios are relative to the initial state energy {:.4}", initial_energy);
        }

        let mut sweep = SweepResult::new(ground_energy, self.reinitialize_state);
        for &s_target in &self.s_targets {
            let experiment = ReverseAnnealExperiment::new(s_target)
                .with_num_reads(self.num_reads)
                .with_schedule(ReverseScheduleSpec {
                    s_target,
                    ..self.schedule
                });
            let set = experiment
                .reverse(sampler, model, initial_state, self.reinitialize_state)
                .await?;

            let label = format!("s_target={s_target}");
            let summary = RunSummary::from_sampleset(
                &label,
                &set,
                Some(initial_state),
                Some(ground_energy),
                self.tolerance,
            )?;
            let point = SweepPoint::from_summary(s_target, &summary);
            info!(
                "s_target {:.3}: ground-state ratio {:.3}, mean energy {:.4}",
                s_target, point.ratio, point.stats.mean
            );
            sweep.push(point);

            if let Some(pb) = progress {
                pb.inc(1);
            }
        }
        Ok(sweep)
    }
}

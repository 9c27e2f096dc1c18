//! Forward anneal followed by reverse anneals from its best state.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use revanneal_hal::{ReverseAnnealParams, SampleParams, Sampler};
use revanneal_ir::{
    AnnealSchedule, AnswerMode, ExactSolver, IsingModel, MAX_EXACT_VARIABLES, ReverseScheduleSpec,
    SampleSet, ScheduleLimits, SpinAssignment,
};
use revanneal_stats::{DEFAULT_GROUND_TOLERANCE, RunSummary, plot_energy_and_hamming};

use super::{GroundReference, RunnerError, RunnerResult, write_json};

/// Result of a [`ReverseAnnealExperiment`].
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentResult {
    /// Solver the experiment ran on.
    pub solver: String,
    /// Energy used as the ground-state reference.
    pub ground_energy: f64,
    /// Where `ground_energy` came from.
    pub ground_reference: GroundReference,
    /// Lowest-energy state of the forward anneal.
    pub initial_state: SpinAssignment,
    /// Energy of `initial_state`.
    pub initial_energy: f64,
    /// Reverse schedule as `[t, s]` pairs.
    pub schedule: Vec<[f64; 2]>,
    /// Forward anneal.
    pub forward: RunSummary,
    /// Reverse anneal restarting from `initial_state` every read.
    pub reverse_reinitialize: RunSummary,
    /// Reverse anneal carrying each read's final state into the next.
    pub reverse_carry_over: RunSummary,
    /// Raw sample sets, in the order above.
    #[serde(skip)]
    pub samplesets: [SampleSet; 3],
}

impl ExperimentResult {
    /// The three runs in submission order.
    pub fn summaries(&self) -> [&RunSummary; 3] {
        [
            &self.forward,
            &self.reverse_reinitialize,
            &self.reverse_carry_over,
        ]
    }

    /// Write `experiment.json`, the raw sample sets and, if `plots`, an
    /// energy/Hamming plot into `dir`. Returns the written paths.
    pub fn write_outputs(&self, dir: &Path, plots: bool) -> RunnerResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dir).map_err(|e| RunnerError::Io {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;

        let mut written = Vec::new();
        let path = dir.join("experiment.json");
        write_json(&path, self)?;
        written.push(path);

        for (name, set) in ["forward", "reverse_reinitialize", "reverse_carry_over"]
            .iter()
            .zip(&self.samplesets)
        {
            let path = dir.join(format!("{name}.sampleset.json"));
            write_json(&path, set)?;
            written.push(path);
        }

        if plots {
            let path = dir.join("energy_hamming.svg");
            plot_energy_and_hamming(&path, &self.summaries())?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Reverse-annealing experiment on one problem.
///
/// 1. Forward anneal in raw mode; its lowest-energy read becomes the
///    initial state.
/// 2. Reverse anneal from that state with `reinitialize_state` true, then
///    false.
/// 3. Ground reference: the exact ground state for at most
///    [`MAX_EXACT_VARIABLES`] spins, else the lowest energy any run saw.
#[derive(Debug, Clone)]
pub struct ReverseAnnealExperiment {
    /// Reads per run.
    pub num_reads: u32,
    /// Reverse schedule geometry. A final ramp faster than the solver
    /// allows is lengthened before submission.
    pub schedule: ReverseScheduleSpec,
    /// Forward anneal duration in µs; the solver default when `None`.
    pub anneal_time: Option<f64>,
    /// Energy tolerance for counting ground-state hits.
    pub tolerance: f64,
    /// Enumerate the ground state when the problem is small enough.
    pub exact: bool,
    /// Label prefix for submitted problems.
    pub label: Option<String>,
}

impl ReverseAnnealExperiment {
    /// Experiment ramping back to `s_target`, 100 reads per run.
    pub fn new(s_target: f64) -> Self {
        Self {
            num_reads: 100,
            schedule: ReverseScheduleSpec::new(s_target),
            anneal_time: None,
            tolerance: DEFAULT_GROUND_TOLERANCE,
            exact: true,
            label: None,
        }
    }

    /// Set the reads per run.
    pub fn with_num_reads(mut self, num_reads: u32) -> Self {
        self.num_reads = num_reads;
        self
    }

    /// Set the reverse schedule geometry.
    pub fn with_schedule(mut self, schedule: ReverseScheduleSpec) -> Self {
        self.schedule = schedule;
        self
    }

    /// Set the hold time at `s_target`.
    pub fn with_hold_time(mut self, hold_time: f64) -> Self {
        self.schedule = self.schedule.with_hold_time(hold_time);
        self
    }

    /// Set the ramp-back slope.
    pub fn with_ramp_back_slope(mut self, slope: f64) -> Self {
        self.schedule = self.schedule.with_ramp_back_slope(slope);
        self
    }

    /// Set the forward anneal duration.
    pub fn with_anneal_time(mut self, anneal_time: f64) -> Self {
        self.anneal_time = Some(anneal_time);
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

    /// Set the label prefix.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Schedule spec adjusted to `sampler`'s slope limit.
    pub fn schedule_for<S: Sampler + ?Sized>(&self, sampler: &S) -> ReverseScheduleSpec {
        fit_ramp_up(self.schedule, &sampler.properties().schedule_limits())
    }

    fn labelled(&self, params: SampleParams, suffix: &str) -> SampleParams {
        match self.label {
            Some(ref prefix) => params.with_label(format!("{prefix} {suffix}")),
            None => params,
        }
    }

    /// Forward anneal in raw mode.
    pub async fn forward<S: Sampler + ?Sized>(
        &self,
        sampler: &S,
        model: &IsingModel,
    ) -> RunnerResult<SampleSet> {
        let mut params = SampleParams::new(self.num_reads).with_answer_mode(AnswerMode::Raw);
        if let Some(time) = self.anneal_time {
            params = params.with_annealing_time(time);
        }
        let params = self.labelled(params, "forward");
        Ok(sampler.sample_ising(model, &params).await?)
    }

    /// Reverse anneal from `initial_state`.
    pub async fn reverse<S: Sampler + ?Sized>(
        &self,
        sampler: &S,
        model: &IsingModel,
        initial_state: &SpinAssignment,
        reinitialize_state: bool,
    ) -> RunnerResult<SampleSet> {
        let spec = self.schedule_for(sampler);
        let reverse = ReverseAnnealParams::new(&spec, initial_state.clone())?
            .with_reinitialize(reinitialize_state);
        let params = SampleParams::new(self.num_reads)
            .with_answer_mode(AnswerMode::Raw)
            .with_reverse_anneal(reverse);
        let suffix = format!("reverse s={} reinit={reinitialize_state}", spec.s_target);
        let params = self.labelled(params, &suffix);
        Ok(sampler.sample_ising(model, &params).await?)
    }

    /// Run all three anneals and summarise them.
    pub async fn run<S: Sampler + ?Sized>(
        &self,
        sampler: &S,
        model: &IsingModel,
    ) -> RunnerResult<ExperimentResult> {
        let schedule = AnnealSchedule::reverse(&self.schedule_for(sampler))?;

        let forward = self.forward(sampler, model).await?;
        let best = forward.lowest().ok_or(RunnerError::NoSamples)?;
        let initial_state = best.sample.clone();
        let initial_energy = best.energy;
        info!(
            "forward anneal lowest energy {:.4} over {} reads",
            initial_energy,
            forward.total_reads()
        );

        let reinit = self.reverse(sampler, model, &initial_state, true).await?;
        let carry = self.reverse(sampler, model, &initial_state, false).await?;

        let observed = [&forward, &reinit, &carry]
            .iter()
            .filter_map(|set| set.lowest().map(|r| r.energy))
            .fold(f64::INFINITY, f64::min);
        let (ground_energy, ground_reference) = ground_reference(model, self.exact, observed)?;

        let summarize = |label: &str, set: &SampleSet, initial: Option<&SpinAssignment>| {
            RunSummary::from_sampleset(label, set, initial, Some(ground_energy), self.tolerance)
        };
        let forward_summary = summarize("forward", &forward, None)?;
        let reinit_summary = summarize("reverse, reinitialize", &reinit, Some(&initial_state))?;
        let carry_summary = summarize("reverse, carry over", &carry, Some(&initial_state))?;

        Ok(ExperimentResult {
            solver: sampler.name().to_string(),
            ground_energy,
            ground_reference,
            initial_state,
            initial_energy,
            schedule: schedule.to_pairs(),
            forward: forward_summary,
            reverse_reinitialize: reinit_summary,
            reverse_carry_over: carry_summary,
            samplesets: [forward, reinit, carry],
        })
    }
}

/// Breakpoint times are rounded to this step, µs.
const TIME_STEP_US: f64 = 1e-4;

/// Lengthen the final ramp when it is steeper than `limits` allow.
///
/// An explicit ramp-up slope is kept as given.
pub fn fit_ramp_up(spec: ReverseScheduleSpec, limits: &ScheduleLimits) -> ReverseScheduleSpec {
    if spec.ramp_up_slope.is_some() {
        return spec;
    }
    let fastest = (1.0 - spec.s_target) / limits.max_slope();
    if spec.ramp_up_time >= fastest + TIME_STEP_US {
        return spec;
    }
    // One extra step absorbs the rounding of the two ramp endpoints.
    spec.with_ramp_up_time(((fastest / TIME_STEP_US).ceil() + 1.0) * TIME_STEP_US)
}

/// Exact ground energy when enabled and small enough, else `observed`.
pub(crate) fn ground_reference(
    model: &IsingModel,
    exact: bool,
    observed: f64,
) -> RunnerResult<(f64, GroundReference)> {
    let n = model.num_variables();
    if exact && n <= MAX_EXACT_VARIABLES {
        let ground = ExactSolver::ground_state(model)?;
        if observed < ground.energy - 1e-9 {
            warn!(
                "observed energy {:.6} is below the exact ground energy {:.6}",
                observed, ground.energy
            );
        }
        return Ok((ground.energy, GroundReference::Exact));
    }
    if exact {
        info!(
            "{} spins exceed the exact solver limit of {}, using the lowest observed energy",
            n, MAX_EXACT_VARIABLES
        );
    }
    if !observed.is_finite() {
        return Err(RunnerError::NoSamples);
    }
    Ok((observed, GroundReference::Observed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use revanneal_ir::DEFAULT_RAMP_UP_TIME;

    fn pair() -> IsingModel {
        let mut model = IsingModel::new();
        model.add_coupling(0, 1, -1.0);
        model
    }

    #[test]
    fn test_fit_ramp_up_keeps_fast_enough_ramp() {
        let spec = ReverseScheduleSpec::new(0.45);
        let fitted = fit_ramp_up(spec, &ScheduleLimits::default());
        assert_eq!(fitted.ramp_up_time, DEFAULT_RAMP_UP_TIME);
    }

    #[test]
    fn test_fit_ramp_up_keeps_explicit_slope() {
        let spec = ReverseScheduleSpec::new(0.45).with_ramp_up_slope(10.0);
        let limits = ScheduleLimits {
            min_anneal_time_us: 0.5,
            ..ScheduleLimits::default()
        };
        assert_eq!(fit_ramp_up(spec, &limits), spec);
    }

    #[test]
    fn test_fit_ramp_up_respects_slow_solver() {
        let limits = ScheduleLimits {
            min_anneal_time_us: 0.5,
            ..ScheduleLimits::default()
        };
        let spec = ReverseScheduleSpec::new(0.45);
        assert!(AnnealSchedule::reverse(&spec).unwrap().validate(&limits).is_err());

        let fitted = fit_ramp_up(spec, &limits);
        assert!(fitted.ramp_up_time > 0.275);
        assert!(fitted.ramp_up_time < 0.2755);
        AnnealSchedule::reverse(&fitted)
            .unwrap()
            .validate(&limits)
            .unwrap();
    }

    #[test]
    fn test_ground_reference_exact() {
        let (energy, reference) = ground_reference(&pair(), true, 5.0).unwrap();
        assert_eq!(energy, -1.0);
        assert_eq!(reference, GroundReference::Exact);
    }

    #[test]
    fn test_ground_reference_observed() {
        let (energy, reference) = ground_reference(&pair(), false, -0.5).unwrap();
        assert_eq!(energy, -0.5);
        assert_eq!(reference, GroundReference::Observed);

        assert!(matches!(
            ground_reference(&pair(), false, f64::INFINITY),
            Err(RunnerError::NoSamples)
        ));
    }
}

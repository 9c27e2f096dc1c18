//! Sampling parameters.
//!
//! [`SampleParams`] collects the per-request settings a solver accepts.
//! [`SampleParams::validate`] is a local pre-flight against
//! [`SolverProperties`]; the remote service remains the final authority.

use std::fmt;

use revanneal_ir::{
    AnnealSchedule, AnswerMode, IrError, IsingModel, ReverseScheduleSpec, ScheduleKind,
    SpinAssignment,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{HalError, HalResult};
use crate::properties::SolverProperties;

/// Dense `initial_state` marker for qubits the problem does not use.
pub const UNUSED_QUBIT_STATE: i8 = 3;

fn default_num_reads() -> u32 {
    1
}

/// Settings for one sampling request.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleParams {
    /// Number of reads (anneal-readout cycles).
    #[serde(default = "default_num_reads")]
    pub num_reads: u32,
    /// Raw reads or aggregated histogram.
    #[serde(default)]
    pub answer_mode: AnswerMode,
    /// Duration of a standard forward anneal, µs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annealing_time: Option<f64>,
    /// Explicit anneal schedule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anneal_schedule: Option<AnnealSchedule>,
    /// Starting state of a reverse anneal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<SpinAssignment>,
    /// Reset to `initial_state` before every read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reinitialize_state: Option<bool>,
    /// Let the service rescale coefficients into range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_scale: Option<bool>,
    /// Wait after each read, µs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readout_thermalization: Option<f64>,
    /// Wait after programming, µs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programming_thermalization: Option<f64>,
    /// Problem label shown in the service dashboard. Not a solver parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Parameters passed through verbatim.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for SampleParams {
    fn default() -> Self {
        Self {
            num_reads: default_num_reads(),
            answer_mode: AnswerMode::default(),
            annealing_time: None,
            anneal_schedule: None,
            initial_state: None,
            reinitialize_state: None,
            auto_scale: None,
            readout_thermalization: None,
            programming_thermalization: None,
            label: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl fmt::Debug for SampleParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleParams")
            .field("num_reads", &self.num_reads)
            .field("answer_mode", &self.answer_mode)
            .field("annealing_time", &self.annealing_time)
            .field(
                "anneal_schedule",
                &self.anneal_schedule.as_ref().map(ToString::to_string),
            )
            .field(
                "initial_state",
                &self.initial_state.as_ref().map(SpinAssignment::len),
            )
            .field("reinitialize_state", &self.reinitialize_state)
            .field("auto_scale", &self.auto_scale)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// The three parameters that together make a reverse anneal.
#[derive(Debug, Clone, PartialEq)]
pub struct ReverseAnnealParams {
    /// Schedule starting at `s = 1`.
    pub schedule: AnnealSchedule,
    /// Classical state the anneal starts from.
    pub initial_state: SpinAssignment,
    /// Reset to `initial_state` before every read.
    pub reinitialize_state: bool,
}

impl ReverseAnnealParams {
    /// Build the schedule from `spec`; `reinitialize_state` defaults to true.
    pub fn new(spec: &ReverseScheduleSpec, initial_state: SpinAssignment) -> HalResult<Self> {
        Ok(Self {
            schedule: AnnealSchedule::reverse(spec)?,
            initial_state,
            reinitialize_state: true,
        })
    }

    /// Set whether each read restarts from the initial state.
    pub fn with_reinitialize(mut self, reinitialize: bool) -> Self {
        self.reinitialize_state = reinitialize;
        self
    }
}

impl SampleParams {
    /// Parameters with `num_reads` set and defaults elsewhere.
    pub fn new(num_reads: u32) -> Self {
        Self {
            num_reads,
            ..Self::default()
        }
    }

    /// Set the number of reads.
    pub fn with_num_reads(mut self, num_reads: u32) -> Self {
        self.num_reads = num_reads;
        self
    }

    /// Set the answer mode.
    pub fn with_answer_mode(mut self, mode: AnswerMode) -> Self {
        self.answer_mode = mode;
        self
    }

    /// Set a forward anneal duration. Clears any explicit schedule.
    pub fn with_annealing_time(mut self, time_us: f64) -> Self {
        self.annealing_time = Some(time_us);
        self.anneal_schedule = None;
        self
    }

    /// Set an explicit schedule. Clears any annealing time.
    pub fn with_anneal_schedule(mut self, schedule: AnnealSchedule) -> Self {
        self.anneal_schedule = Some(schedule);
        self.annealing_time = None;
        self
    }

    /// Set the reverse-anneal starting state.
    pub fn with_initial_state(mut self, state: SpinAssignment) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the reinitialize flag.
    pub fn with_reinitialize_state(mut self, reinitialize: bool) -> Self {
        self.reinitialize_state = Some(reinitialize);
        self
    }

    /// Configure a reverse anneal in one step.
    pub fn with_reverse_anneal(self, reverse: ReverseAnnealParams) -> Self {
        self.with_anneal_schedule(reverse.schedule)
            .with_initial_state(reverse.initial_state)
            .with_reinitialize_state(reverse.reinitialize_state)
    }

    /// Set auto-scaling.
    pub fn with_auto_scale(mut self, auto_scale: bool) -> Self {
        self.auto_scale = Some(auto_scale);
        self
    }

    /// Set the readout thermalization delay.
    pub fn with_readout_thermalization(mut self, delay_us: f64) -> Self {
        self.readout_thermalization = Some(delay_us);
        self
    }

    /// Set the programming thermalization delay.
    pub fn with_programming_thermalization(mut self, delay_us: f64) -> Self {
        self.programming_thermalization = Some(delay_us);
        self
    }

    /// Set the problem label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Pass an additional parameter through unchanged.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Whether the request is a reverse anneal.
    pub fn is_reverse_anneal(&self) -> bool {
        self.anneal_schedule
            .as_ref()
            .is_some_and(AnnealSchedule::is_reverse)
    }

    /// Effective auto-scale setting; the service enables it by default.
    pub fn auto_scale_enabled(&self) -> bool {
        self.auto_scale.unwrap_or(true)
    }

    /// Solver parameter names this request sends.
    pub fn parameter_names(&self) -> Vec<&str> {
        let mut names = vec!["num_reads", "answer_mode"];
        let optional = [
            ("annealing_time", self.annealing_time.is_some()),
            ("anneal_schedule", self.anneal_schedule.is_some()),
            ("initial_state", self.initial_state.is_some()),
            ("reinitialize_state", self.reinitialize_state.is_some()),
            ("auto_scale", self.auto_scale.is_some()),
            ("readout_thermalization", self.readout_thermalization.is_some()),
            ("programming_thermalization", self.programming_thermalization.is_some()),
        ];
        names.extend(optional.iter().filter(|(_, set)| *set).map(|(n, _)| *n));
        names.extend(self.extra.keys().map(String::as_str));
        names
    }

    /// Check the request against a solver before submission.
    pub fn validate(&self, model: &IsingModel, properties: &SolverProperties) -> HalResult<()> {
        validate_problem(model, properties, self.auto_scale_enabled())?;

        let [min_reads, max_reads] = properties.num_reads_range;
        if self.num_reads < min_reads || self.num_reads > max_reads {
            return Err(HalError::InvalidParameter(format!(
                "num_reads {} outside [{min_reads}, {max_reads}]",
                self.num_reads
            )));
        }

        if self.annealing_time.is_some() && self.anneal_schedule.is_some() {
            return Err(HalError::InvalidParameter(
                "annealing_time and anneal_schedule are mutually exclusive".into(),
            ));
        }

        if let Some(time) = self.annealing_time {
            let [lo, hi] = properties.annealing_time_range;
            if !(lo..=hi).contains(&time) {
                return Err(HalError::InvalidParameter(format!(
                    "annealing_time {time} outside [{lo}, {hi}]"
                )));
            }
        }

        if let Some(ref schedule) = self.anneal_schedule {
            schedule.validate(&properties.schedule_limits())?;
        }

        match (self.is_reverse_anneal(), self.initial_state.as_ref()) {
            (true, None) => {
                return Err(HalError::InvalidParameter(
                    "reverse anneal requires an initial_state".into(),
                ));
            }
            (false, Some(_)) => {
                return Err(HalError::InvalidParameter(
                    "initial_state requires a reverse anneal schedule".into(),
                ));
            }
            (true, Some(state)) => validate_initial_state(state, model)?,
            (false, None) => {}
        }

        if self.reinitialize_state.is_some() && !self.is_reverse_anneal() {
            warn!("reinitialize_state has no effect without a reverse anneal schedule");
        }

        if let Some(ScheduleKind::Forward) =
            self.anneal_schedule.as_ref().and_then(AnnealSchedule::kind)
        {
            if self.reinitialize_state == Some(false) {
                warn!("reinitialize_state=false ignored for a forward schedule");
            }
        }

        // Solvers that publish no parameter list are not checked.
        if !properties.parameters.is_empty() {
            if let Some(name) = self
                .parameter_names()
                .into_iter()
                .find(|name| !properties.supports_parameter(name))
            {
                return Err(HalError::InvalidParameter(format!(
                    "solver does not accept parameter '{name}'"
                )));
            }
        }

        Ok(())
    }

    /// JSON `params` object for submission.
    ///
    /// `initial_state` is expanded to a dense array over `0..num_qubits`
    /// with [`UNUSED_QUBIT_STATE`] for qubits outside the state.
    pub fn to_wire(&self, num_qubits: u32) -> HalResult<serde_json::Value> {
        let mut params = serde_json::Map::new();
        params.insert("num_reads".into(), self.num_reads.into());
        params.insert("answer_mode".into(), self.answer_mode.as_str().into());

        if let Some(time) = self.annealing_time {
            params.insert("annealing_time".into(), time.into());
        }
        if let Some(ref schedule) = self.anneal_schedule {
            params.insert("anneal_schedule".into(), serde_json::to_value(schedule.to_pairs())?);
        }
        if let Some(ref state) = self.initial_state {
            let mut dense = vec![UNUSED_QUBIT_STATE; num_qubits as usize];
            for (qubit, spin) in state.iter() {
                let slot = dense.get_mut(qubit as usize).ok_or_else(|| {
                    HalError::InvalidParameter(format!(
                        "initial_state qubit {qubit} beyond solver size {num_qubits}"
                    ))
                })?;
                *slot = spin;
            }
            params.insert("initial_state".into(), serde_json::to_value(dense)?);
        }
        if let Some(reinit) = self.reinitialize_state {
            params.insert("reinitialize_state".into(), reinit.into());
        }
        if let Some(auto_scale) = self.auto_scale {
            params.insert("auto_scale".into(), auto_scale.into());
        }
        if let Some(delay) = self.readout_thermalization {
            params.insert("readout_thermalization".into(), delay.into());
        }
        if let Some(delay) = self.programming_thermalization {
            params.insert("programming_thermalization".into(), delay.into());
        }
        for (key, value) in &self.extra {
            params.insert(key.clone(), value.clone());
        }

        Ok(serde_json::Value::Object(params))
    }
}

/// Check that `model` fits the solver's working graph and ranges.
///
/// Out-of-range coefficients are only warned about when `auto_scale` is on.
pub fn validate_problem(
    model: &IsingModel,
    properties: &SolverProperties,
    auto_scale: bool,
) -> HalResult<()> {
    model.validate()?;
    if model.is_empty() {
        return Err(IrError::EmptyProblem.into());
    }

    let qubits = properties.qubit_set();
    if let Some(node) = model.variables().into_iter().find(|n| !qubits.contains(n)) {
        return Err(HalError::InvalidProblem(format!(
            "qubit {node} is not an active qubit of the solver"
        )));
    }

    let couplers = properties.coupler_set();
    if let Some(((u, v), _)) = model.couplings().find(|(key, _)| !couplers.contains(key)) {
        return Err(HalError::InvalidProblem(format!(
            "coupler ({u}, {v}) is not an active coupler of the solver"
        )));
    }

    let [h_lo, h_hi] = properties.h_range;
    for (node, value) in model.biases() {
        if !(h_lo..=h_hi).contains(&value) {
            let msg = format!("h[{node}] = {value} outside [{h_lo}, {h_hi}]");
            if auto_scale {
                warn!("{msg}; the solver will rescale");
            } else {
                return Err(HalError::InvalidProblem(msg));
            }
        }
    }

    let [j_lo, j_hi] = properties.j_range;
    for ((u, v), value) in model.couplings() {
        if !(j_lo..=j_hi).contains(&value) {
            let msg = format!("J[{u}, {v}] = {value} outside [{j_lo}, {j_hi}]");
            if auto_scale {
                warn!("{msg}; the solver will rescale");
            } else {
                return Err(HalError::InvalidProblem(msg));
            }
        }
    }

    Ok(())
}

fn validate_initial_state(state: &SpinAssignment, model: &IsingModel) -> HalResult<()> {
    let variables = model.variables();
    if state.variables() != variables {
        return Err(HalError::InvalidParameter(format!(
            "initial_state covers {} variables, problem has {}",
            state.len(),
            variables.len()
        )));
    }
    if let Some((node, value)) = state.iter().find(|&(_, s)| s != 1 && s != -1) {
        return Err(IrError::InvalidSpin { node, value }.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::REVERSE_ANNEAL_PARAMETERS;

    fn props() -> SolverProperties {
        SolverProperties::from_graph(vec![0, 1, 2, 3], vec![[0, 1], [1, 2], [2, 3]])
            .with_parameters(["num_reads", "answer_mode", "annealing_time", "auto_scale"])
            .with_parameters(REVERSE_ANNEAL_PARAMETERS)
    }

    fn chain() -> IsingModel {
        let mut model = IsingModel::new();
        model.add_coupling(0, 1, -1.0);
        model.add_coupling(1, 2, -1.0);
        model.add_bias(0, 0.1);
        model
    }

    fn reverse(model: &IsingModel) -> ReverseAnnealParams {
        // Advantage-like limits allow a slope of at most 1 / 0.5 µs.
        ReverseAnnealParams::new(
            &ReverseScheduleSpec::new(0.45).with_ramp_up_slope(2.0),
            SpinAssignment::all_up(&model.variables()),
        )
        .unwrap()
    }

    #[test]
    fn test_forward_params_validate() {
        let params = SampleParams::new(100).with_annealing_time(20.0);
        params.validate(&chain(), &props()).unwrap();
    }

    #[test]
    fn test_reverse_params_validate() {
        let model = chain();
        let params = SampleParams::new(100).with_reverse_anneal(reverse(&model).with_reinitialize(false));
        assert!(params.is_reverse_anneal());
        assert_eq!(params.reinitialize_state, Some(false));
        params.validate(&model, &props()).unwrap();
    }

    #[test]
    fn test_inactive_qubit_rejected() {
        let mut model = chain();
        model.add_bias(9, 0.5);
        let err = SampleParams::new(1).validate(&model, &props()).unwrap_err();
        assert!(matches!(err, HalError::InvalidProblem(msg) if msg.contains("qubit 9")));
    }

    #[test]
    fn test_inactive_coupler_rejected() {
        let mut model = chain();
        model.add_coupling(0, 3, 1.0);
        let err = SampleParams::new(1).validate(&model, &props()).unwrap_err();
        assert!(matches!(err, HalError::InvalidProblem(msg) if msg.contains("(0, 3)")));
    }

    #[test]
    fn test_range_is_soft_with_auto_scale() {
        let mut model = chain();
        model.set_coupling(0, 1, -2.0).unwrap();
        SampleParams::new(1).validate(&model, &props()).unwrap();

        let err = SampleParams::new(1)
            .with_auto_scale(false)
            .validate(&model, &props())
            .unwrap_err();
        assert!(matches!(err, HalError::InvalidProblem(_)));
    }

    #[test]
    fn test_num_reads_range() {
        let err = SampleParams::new(0).validate(&chain(), &props()).unwrap_err();
        assert!(matches!(err, HalError::InvalidParameter(msg) if msg.contains("num_reads")));
    }

    #[test]
    fn test_time_and_schedule_exclusive() {
        let mut params = SampleParams::new(1).with_anneal_schedule(AnnealSchedule::forward(20.0).unwrap());
        params.annealing_time = Some(20.0);
        let err = params.validate(&chain(), &props()).unwrap_err();
        assert!(matches!(err, HalError::InvalidParameter(msg) if msg.contains("mutually exclusive")));
    }

    #[test]
    fn test_reverse_requires_initial_state() {
        let model = chain();
        let mut params = SampleParams::new(1).with_reverse_anneal(reverse(&model));
        params.initial_state = None;
        assert!(params.validate(&model, &props()).is_err());

        let stray = SampleParams::new(1).with_initial_state(SpinAssignment::all_up(&model.variables()));
        assert!(stray.validate(&model, &props()).is_err());
    }

    #[test]
    fn test_initial_state_must_match_variables() {
        let model = chain();
        let params = SampleParams::new(1).with_reverse_anneal(ReverseAnnealParams {
            initial_state: SpinAssignment::all_up(&[0, 1]),
            ..reverse(&model)
        });
        let err = params.validate(&model, &props()).unwrap_err();
        assert!(matches!(err, HalError::InvalidParameter(msg) if msg.contains("initial_state")));
    }

    #[test]
    fn test_schedule_checked_against_limits() {
        let model = chain();
        let state = SpinAssignment::all_up(&model.variables());
        // The default 0.0201 µs ramp-up is steeper than 1 / 0.5.
        let quench = ReverseAnnealParams::new(&ReverseScheduleSpec::new(0.45), state.clone()).unwrap();
        let err = SampleParams::new(1)
            .with_reverse_anneal(quench)
            .validate(&model, &props())
            .unwrap_err();
        assert!(matches!(err, HalError::InvalidSchedule(_)));

        let mut fast = props();
        fast.annealing_time_range = [0.02, 2000.0];
        let quench = ReverseAnnealParams::new(&ReverseScheduleSpec::new(0.45), state).unwrap();
        SampleParams::new(1)
            .with_reverse_anneal(quench)
            .validate(&model, &fast)
            .unwrap();
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let params = SampleParams::new(1).with_extra("flux_biases", serde_json::json!([]));
        let err = params.validate(&chain(), &props()).unwrap_err();
        assert!(matches!(err, HalError::InvalidParameter(msg) if msg.contains("flux_biases")));
    }

    #[test]
    fn test_to_wire_dense_initial_state() {
        let model = chain();
        let params = SampleParams::new(10)
            .with_answer_mode(AnswerMode::Raw)
            .with_reverse_anneal(reverse(&model))
            .with_label("ra");
        let wire = params.to_wire(5).unwrap();

        assert_eq!(wire["num_reads"], 10);
        assert_eq!(wire["answer_mode"], "raw");
        assert_eq!(wire["initial_state"], serde_json::json!([1, 1, 1, 3, 3]));
        assert_eq!(wire["reinitialize_state"], true);
        assert_eq!(wire["anneal_schedule"][0], serde_json::json!([0.0, 1.0]));
        assert!(wire.get("label").is_none());
    }

    #[test]
    fn test_to_wire_rejects_out_of_range_state() {
        let params = SampleParams::new(1).with_initial_state(SpinAssignment::all_up(&[7]));
        assert!(params.to_wire(4).is_err());
    }
}

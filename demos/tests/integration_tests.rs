//! Integration tests for the demo suite.
//!
//! Experiments run end to end against an in-memory sampler, so results are
//! deterministic and no SAPI token is needed.

use revanneal_demos::problems::{CHAIN_END_BIAS, ProblemKind, build_problem, from_json};
use revanneal_demos::runners::{GroundReference, ReverseAnnealExperiment, SweepRunner, write_json};
use revanneal_hal::testing::ScriptedSampler;
use revanneal_hal::{REVERSE_ANNEAL_PARAMETERS, Sampler, SolverProperties};
use revanneal_ir::{AnnealSchedule, IsingModel, SpinAssignment};

/// 4x4 grid, qubit `r * 4 + c`, with the reverse-anneal parameters listed.
fn grid_properties() -> SolverProperties {
    let mut couplers = Vec::new();
    for r in 0..4u32 {
        for c in 0..4u32 {
            let q = r * 4 + c;
            if c < 3 {
                couplers.push([q, q + 1]);
            }
            if r < 3 {
                couplers.push([q, q + 4]);
            }
        }
    }
    SolverProperties::from_graph((0..16).collect(), couplers)
        .with_parameters(["num_reads", "answer_mode", "annealing_time"])
        .with_parameters(REVERSE_ANNEAL_PARAMETERS)
}

/// Forward reads are all `+1`; reverse reads echo the initial state.
fn all_up_sampler() -> ScriptedSampler {
    ScriptedSampler::new(grid_properties(), |model, params| {
        let state = match params.initial_state {
            Some(ref state) => state.clone(),
            None => SpinAssignment::all_up(&model.variables()),
        };
        Ok(vec![state; params.num_reads as usize])
    })
    .with_name("grid-4x4")
}

fn chain(n: usize) -> IsingModel {
    build_problem(ProblemKind::Chain, &grid_properties(), n, None, 0).unwrap()
}

#[tokio::test]
async fn test_experiment_finds_chain_ground_state() {
    let sampler = all_up_sampler();
    let model = chain(6);
    let expected_ground = -5.0 + CHAIN_END_BIAS;

    let result = ReverseAnnealExperiment::new(0.45)
        .with_num_reads(20)
        .run(&sampler, &model)
        .await
        .unwrap();

    assert_eq!(result.solver, "grid-4x4");
    assert_eq!(result.ground_reference, GroundReference::Exact);
    assert!((result.ground_energy - expected_ground).abs() < 1e-9);
    assert!((result.initial_energy - expected_ground).abs() < 1e-9);
    for summary in result.summaries() {
        assert_eq!(summary.stats.count, 20);
        assert_eq!(summary.ground_state_ratio, Some(1.0));
    }
    assert_eq!(
        result.reverse_reinitialize.mean_hamming_from_initial(),
        Some(0.0)
    );
    assert!(result.forward.hamming_from_initial.is_none());
}

#[tokio::test]
async fn test_experiment_submits_forward_then_both_reverse_modes() {
    let sampler = all_up_sampler();
    let model = chain(4);

    ReverseAnnealExperiment::new(0.6)
        .with_num_reads(5)
        .with_label("it")
        .run(&sampler, &model)
        .await
        .unwrap();

    let requests = sampler.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].anneal_schedule.is_none());
    assert!(requests[0].initial_state.is_none());
    assert_eq!(requests[1].reinitialize_state, Some(true));
    assert_eq!(requests[2].reinitialize_state, Some(false));
    for reverse in &requests[1..] {
        let schedule = reverse.anneal_schedule.as_ref().unwrap();
        assert!(schedule.is_reverse());
        assert_eq!(schedule.min_s(), Some(0.6));
        schedule
            .validate(&sampler.properties().schedule_limits())
            .unwrap();
    }
    assert_eq!(requests[0].label.as_deref(), Some("it forward"));
}

#[tokio::test]
async fn test_schedule_respects_solver_slope_limit() {
    let sampler = all_up_sampler();
    let experiment = ReverseAnnealExperiment::new(0.45);
    let limits = sampler.properties().schedule_limits();

    // The default 0.0201 µs ramp up is too steep for a 0.5 µs minimum.
    let raw = AnnealSchedule::reverse(&experiment.schedule).unwrap();
    assert!(raw.validate(&limits).is_err());

    let fitted = AnnealSchedule::reverse(&experiment.schedule_for(&sampler)).unwrap();
    fitted.validate(&limits).unwrap();
}

#[tokio::test]
async fn test_sweep_records_every_target() {
    let sampler = all_up_sampler();
    let model = chain(5);
    let initial = SpinAssignment::all_up(&model.variables());
    let targets = SweepRunner::linspace(0.3, 0.7, 5);

    let sweep = SweepRunner::new(targets.clone())
        .with_num_reads(10)
        .with_reinitialize(false)
        .run(&sampler, &model, &initial, None)
        .await
        .unwrap();

    assert!(!sweep.reinitialize_state);
    assert_eq!(sweep.points.len(), 5);
    let seen: Vec<f64> = sweep.points.iter().map(|p| p.s_target).collect();
    assert_eq!(seen, targets);
    assert!(sweep.points.iter().all(|p| p.ratio == 1.0));
    // Ties go to the earliest point.
    assert_eq!(sweep.best().unwrap().s_target, 0.3);
    assert_eq!(sampler.requests().len(), 5);
}

#[tokio::test]
async fn test_sweep_without_targets_fails() {
    let sampler = all_up_sampler();
    let model = chain(3);
    let initial = SpinAssignment::all_up(&model.variables());
    let err = SweepRunner::new(Vec::new())
        .run(&sampler, &model, &initial, None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Sweep has no s_target values");
}

#[tokio::test]
async fn test_reverse_without_solver_support_is_rejected() {
    let props = SolverProperties::from_graph(vec![0, 1], vec![[0, 1]])
        .with_parameters(["num_reads", "answer_mode"]);
    let sampler = ScriptedSampler::echo(props);
    let mut model = IsingModel::new();
    model.add_coupling(0, 1, -1.0);

    let err = ReverseAnnealExperiment::new(0.5)
        .with_num_reads(3)
        .run(&sampler, &model)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("anneal_schedule"));
    // The forward anneal went through before the reverse was refused.
    assert_eq!(sampler.requests().len(), 1);
}

#[tokio::test]
async fn test_write_outputs() {
    let sampler = all_up_sampler();
    let model = build_problem(ProblemKind::SpinGlass, sampler.properties(), 8, Some(5), 7).unwrap();
    let result = ReverseAnnealExperiment::new(0.5)
        .with_num_reads(4)
        .run(&sampler, &model)
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let written = result.write_outputs(dir.path(), false).unwrap();
    assert_eq!(written.len(), 4);
    for path in &written {
        assert!(path.exists(), "{} missing", path.display());
    }

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("experiment.json")).unwrap())
            .unwrap();
    assert_eq!(json["solver"], "grid-4x4");
    assert_eq!(json["ground_reference"], "exact");
    assert!(json.get("samplesets").is_none());

    let forward = std::fs::read_to_string(dir.path().join("forward.sampleset.json")).unwrap();
    let set = revanneal_ir::SampleSet::from_json(&forward).unwrap();
    assert_eq!(set.total_reads(), 4);
}

#[test]
fn test_saved_problem_loads_back() {
    let model = build_problem(ProblemKind::FrustratedLoop, &grid_properties(), 9, None, 0).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("problem.json");
    write_json(&path, &model).unwrap();

    assert_eq!(from_json(&path).unwrap(), model);
}

#[test]
fn test_generated_problems_fit_the_grid() {
    let props = grid_properties();
    for kind in [ProblemKind::SpinGlass, ProblemKind::Chain, ProblemKind::FrustratedLoop] {
        let model = build_problem(kind, &props, 9, None, 1).unwrap();
        assert_eq!(model.num_variables(), 9, "{kind}");
        for ((u, v), _) in model.couplings() {
            assert!(props.has_coupler(u, v), "{kind}: {u}-{v} is not a coupler");
        }
    }
}

//! Forward command implementation.

use anyhow::{Context, Result};
use console::style;

use revanneal_demos::config::Config;
use revanneal_demos::print_summary;
use revanneal_demos::runners::ReverseAnnealExperiment;
use revanneal_hal::Sampler;
use revanneal_ir::{ExactSolver, MAX_EXACT_VARIABLES};
use revanneal_stats::RunSummary;

use super::common::{connect, load_problem, save_json};
use crate::ProblemArgs;

/// Execute the forward command.
pub async fn execute(
    config: &Config,
    problem: &ProblemArgs,
    num_reads: Option<u32>,
    anneal_time: Option<f64>,
) -> Result<()> {
    let sampler = connect(config).await?;
    let model = load_problem(config, problem, sampler.properties())?;

    let exp = &config.experiment;
    let num_reads = num_reads.unwrap_or(exp.num_reads);
    let mut experiment = ReverseAnnealExperiment::new(exp.s_target)
        .with_num_reads(num_reads)
        .with_label("revanneal");
    if let Some(time) = anneal_time.or(exp.anneal_time) {
        experiment = experiment.with_anneal_time(time);
    }

    println!(
        "{} Forward anneal, {} reads",
        style("→").cyan().bold(),
        num_reads
    );
    let set = experiment
        .forward(&sampler, &model)
        .await
        .context("Forward anneal failed")?;

    let ground_energy = if model.num_variables() <= MAX_EXACT_VARIABLES {
        Some(ExactSolver::ground_state(&model)?.energy)
    } else {
        None
    };
    let summary = RunSummary::from_sampleset("forward", &set, None, ground_energy, exp.tolerance)?;
    println!();
    print_summary(&summary);
    println!();

    save_json(config, "problem.json", &model)?;
    save_json(config, "forward.sampleset.json", &set)?;
    Ok(())
}

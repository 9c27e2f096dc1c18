//! Reverse command implementation.

use anyhow::{Context, Result};
use console::style;

use revanneal_demos::config::Config;
use revanneal_demos::runners::{GroundReference, ReverseAnnealExperiment};
use revanneal_demos::{print_result, print_success, print_summary, print_warning};
use revanneal_hal::Sampler;

use super::common::{connect, load_problem, save_json};
use crate::ProblemArgs;

/// Execute the reverse command.
pub async fn execute(
    config: &Config,
    problem: &ProblemArgs,
    s_target: Option<f64>,
    num_reads: Option<u32>,
    hold_time: Option<f64>,
    plots: bool,
) -> Result<()> {
    let sampler = connect(config).await?;
    if !sampler.properties().supports_reverse_anneal() {
        print_warning("solver does not list reverse-anneal parameters; submission may be rejected");
    }
    let model = load_problem(config, problem, sampler.properties())?;

    let exp = &config.experiment;
    let mut spec = exp.schedule(s_target.unwrap_or(exp.s_target));
    if let Some(hold) = hold_time {
        spec = spec.with_hold_time(hold);
    }
    let mut experiment = ReverseAnnealExperiment::new(spec.s_target)
        .with_schedule(spec)
        .with_num_reads(num_reads.unwrap_or(exp.num_reads))
        .with_tolerance(exp.tolerance)
        .with_label("revanneal");
    if let Some(time) = exp.anneal_time {
        experiment = experiment.with_anneal_time(time);
    }

    println!(
        "{} Forward anneal, then reverse to s = {} ({} reads each)",
        style("→").cyan().bold(),
        style(spec.s_target).green(),
        experiment.num_reads
    );
    let result = experiment
        .run(&sampler, &model)
        .await
        .context("Reverse-anneal experiment failed")?;

    println!();
    print_result("Initial state energy", format!("{:.4}", result.initial_energy));
    let reference = match result.ground_reference {
        GroundReference::Exact => "exact",
        GroundReference::Observed => "lowest observed",
    };
    print_result("Ground energy", format!("{:.4} ({reference})", result.ground_energy));
    print_result("Schedule", format!("{:?}", result.schedule));
    println!();
    for summary in result.summaries() {
        print_summary(summary);
        println!();
    }

    save_json(config, "problem.json", &model)?;
    let written = result
        .write_outputs(&config.output.directory, plots && config.output.plots)
        .context("Failed to write results")?;
    for path in written {
        print_success(&format!("Wrote {}", path.display()));
    }
    Ok(())
}

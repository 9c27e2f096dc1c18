//! Sweep command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use revanneal_demos::config::Config;
use revanneal_demos::runners::{ReverseAnnealExperiment, SweepRunner};
use revanneal_demos::{create_progress_bar, print_result, print_success};
use revanneal_hal::Sampler;
use revanneal_stats::plot_sweep;

use super::common::{connect, load_problem, load_state, save_json};
use crate::ProblemArgs;

/// Execute the sweep command.
pub async fn execute(
    config: &Config,
    problem: &ProblemArgs,
    s_targets: Option<Vec<f64>>,
    num_reads: Option<u32>,
    reinitialize: bool,
    initial_state: Option<&Path>,
    plots: bool,
) -> Result<()> {
    let sampler = connect(config).await?;
    let model = load_problem(config, problem, sampler.properties())?;

    let exp = &config.experiment;
    let num_reads = num_reads.unwrap_or(exp.num_reads);
    let s_targets = s_targets.unwrap_or_else(|| exp.s_targets.clone());

    let initial = match initial_state {
        Some(path) => load_state(path)?,
        None => {
            println!("{} Forward anneal for the initial state", style("→").cyan().bold());
            let mut forward = ReverseAnnealExperiment::new(exp.s_target)
                .with_num_reads(num_reads)
                .with_label("revanneal");
            if let Some(time) = exp.anneal_time {
                forward = forward.with_anneal_time(time);
            }
            let set = forward.forward(&sampler, &model).await?;
            let best = set
                .lowest()
                .context("Forward anneal returned no samples")?;
            best.sample.clone()
        }
    };
    let initial_energy = model.energy(&initial).context("Initial state does not cover the problem")?;
    print_result("Initial state energy", format!("{initial_energy:.4}"));

    let runner = SweepRunner::new(s_targets)
        .with_schedule(exp.schedule(exp.s_target))
        .with_num_reads(num_reads)
        .with_reinitialize(reinitialize)
        .with_tolerance(exp.tolerance);

    println!(
        "{} Sweeping {} targets on {} (reinitialize_state = {})",
        style("→").cyan().bold(),
        runner.s_targets.len(),
        style(sampler.name()).bold(),
        reinitialize
    );
    let pb = create_progress_bar(runner.s_targets.len() as u64, "reverse anneals");
    let result = runner.run(&sampler, &model, &initial, Some(&pb)).await;
    pb.finish_and_clear();
    let result = result.context("Sweep failed")?;

    println!();
    println!(
        "  {:>8}  {:>8}  {:>10}  {:>10}  {:>10}",
        style("s_target").bold(),
        style("ratio").bold(),
        style("mean E").bold(),
        style("min E").bold(),
        style("Hamming").bold()
    );
    for point in &result.points {
        let hamming = point
            .mean_hamming_from_initial
            .map_or_else(|| "-".to_string(), |h| format!("{h:.2}"));
        println!(
            "  {:>8.3}  {:>8.3}  {:>10.4}  {:>10.4}  {:>10}",
            point.s_target, point.ratio, point.stats.mean, point.stats.lowest, hamming
        );
    }
    println!();
    print_result("Ground energy", format!("{:.4}", result.ground_energy));
    if let Some(best) = result.best() {
        print_result(
            "Best s_target",
            format!("{} (ratio {:.3})", best.s_target, best.ratio),
        );
    }

    save_json(config, "problem.json", &model)?;
    save_json(config, "sweep.json", &result)?;
    if plots && config.output.plots {
        let path = config.output.directory.join("sweep.svg");
        plot_sweep(&path, &result).context("Failed to plot sweep")?;
        print_success(&format!("Wrote {}", path.display()));
    }
    Ok(())
}

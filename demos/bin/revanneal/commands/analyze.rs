//! Analyze command implementation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use console::style;

use revanneal_demos::config::Config;
use revanneal_demos::problems::from_json;
use revanneal_demos::{print_result, print_success, print_summary, print_warning};
use revanneal_ir::{ExactSolver, MAX_EXACT_VARIABLES, SampleSet};
use revanneal_stats::{RunSummary, plot_energy_and_hamming};

use super::common::load_state;

/// Execute the analyze command.
pub fn execute(
    config: &Config,
    sampleset: &Path,
    problem_file: Option<&Path>,
    ground_energy: Option<f64>,
    initial_state: Option<&Path>,
    plot: Option<&Path>,
) -> Result<()> {
    let contents = fs::read_to_string(sampleset)
        .with_context(|| format!("Failed to read file: {}", sampleset.display()))?;
    let set = SampleSet::from_json(&contents)
        .with_context(|| format!("Invalid sample set: {}", sampleset.display()))?;
    println!(
        "{} {}: {} distinct samples, {} reads, {} mode",
        style("→").cyan().bold(),
        style(sampleset.display()).green(),
        set.len(),
        set.total_reads(),
        set.answer_mode.as_str()
    );

    let ground_energy = match (problem_file, ground_energy) {
        (Some(path), _) => {
            let model = from_json(path)
                .with_context(|| format!("Failed to load problem: {}", path.display()))?;
            if model.num_variables() > MAX_EXACT_VARIABLES {
                bail!(
                    "Problem has {} spins; exact ground state is limited to {}. Pass --ground-energy instead.",
                    model.num_variables(),
                    MAX_EXACT_VARIABLES
                );
            }
            let ground = ExactSolver::ground_state(&model)?;
            print_result(
                "Exact ground energy",
                format!("{:.4} ({} states)", ground.energy, ground.degeneracy()),
            );
            Some(ground.energy)
        }
        (None, energy) => energy,
    };
    if ground_energy.is_none() {
        print_warning("no ground-state reference; ratios are not reported");
    }

    let initial = initial_state.map(load_state).transpose()?;
    let label = sampleset
        .file_name()
        .map_or_else(|| "samples".to_string(), |n| n.to_string_lossy().into_owned());
    let summary = RunSummary::from_sampleset(
        label,
        &set,
        initial.as_ref(),
        ground_energy,
        config.experiment.tolerance,
    )?;

    println!();
    print_summary(&summary);

    if let Some(path) = plot {
        plot_energy_and_hamming(path, &[&summary]).context("Failed to plot")?;
        print_success(&format!("Wrote {}", path.display()));
    }
    Ok(())
}

//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::ProgressBar;

use revanneal_adapter_dwave::DWaveSampler;
use revanneal_demos::config::Config;
use revanneal_demos::problems::{build_problem, from_json};
use revanneal_demos::runners::write_json;
use revanneal_hal::SolverProperties;
use revanneal_ir::{IsingModel, SpinAssignment};

use crate::ProblemArgs;

/// Connect to the configured solver, with a spinner while properties load.
pub async fn connect(config: &Config) -> Result<DWaveSampler> {
    let dwave = config.dwave_config()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Connecting to {}", dwave.endpoint));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let sampler = DWaveSampler::connect(dwave).await;
    spinner.finish_and_clear();

    let sampler = sampler.context("Failed to connect to SAPI")?;
    println!(
        "{} Solver {}",
        style("→").cyan().bold(),
        style(revanneal_hal::Sampler::name(&sampler)).bold()
    );
    Ok(sampler)
}

/// Build or load the problem selected by `args`, falling back to the
/// `experiment` section of the configuration.
pub fn load_problem(config: &Config, args: &ProblemArgs, properties: &SolverProperties) -> Result<IsingModel> {
    if let Some(ref path) = args.problem_file {
        return from_json(path).with_context(|| format!("Failed to load problem: {}", path.display()));
    }

    let exp = &config.experiment;
    let kind = args.problem.unwrap_or(exp.problem);
    let size = args.size.unwrap_or(exp.problem_size);
    let seed = args.seed.unwrap_or(exp.seed);
    let seed_qubit = args.seed_qubit.or(exp.seed_qubit);

    let model = build_problem(kind, properties, size, seed_qubit, seed)
        .with_context(|| format!("Failed to build {kind} problem with {size} spins"))?;
    println!(
        "{} {} problem: {} spins, {} couplers (seed {})",
        style("→").cyan().bold(),
        kind,
        model.num_variables(),
        model.num_interactions(),
        seed
    );
    Ok(model)
}

/// Load a spin assignment from `{"<qubit>": ±1, ...}` JSON.
pub fn load_state(path: &Path) -> Result<SpinAssignment> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let state: std::collections::BTreeMap<u32, i8> = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid initial state: {}", path.display()))?;
    Ok(SpinAssignment::from_pairs(state)?)
}

/// Create the output directory and save `value` as `name` inside it.
pub fn save_json<T: serde::Serialize>(config: &Config, name: &str, value: &T) -> Result<()> {
    let dir = &config.output.directory;
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    let path = dir.join(name);
    write_json(&path, value)?;
    println!("{} Wrote {}", style("✓").green().bold(), path.display());
    Ok(())
}

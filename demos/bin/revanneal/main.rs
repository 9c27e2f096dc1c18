//! revanneal command-line interface
//!
//! Reverse-annealing experiments against a D-Wave solver.
//!
//! ```text
//! revanneal solvers                       list solvers visible to the token
//! revanneal properties                    show the selected solver's properties
//! revanneal schedule --s-target 0.45      print and check a reverse schedule
//! revanneal forward                       forward anneal a generated problem
//! revanneal reverse                       forward, then reverse with and without reinitialization
//! revanneal sweep                         reverse anneal over a range of s_target values
//! revanneal analyze run.sampleset.json    statistics of a saved sample set
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use console::style;

use revanneal_demos::config::Config;
use revanneal_demos::problems::ProblemKind;
use revanneal_demos::tracing_config::{TracingConfig, init_tracing};

mod commands;

use commands::{analyze, forward, properties, reverse, schedule, solvers, sweep};

/// revanneal - reverse-annealing experiments on a quantum annealer
#[derive(Parser)]
#[command(name = "revanneal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "REVANNEAL_CONFIG")]
    config: Option<PathBuf>,

    /// Solver id, overriding the configuration
    #[arg(long, global = true)]
    solver: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Where the problem comes from.
#[derive(Args, Debug, Clone)]
pub struct ProblemArgs {
    /// Generated problem family
    #[arg(long, value_enum)]
    problem: Option<ProblemKind>,

    /// Load the problem from JSON instead ({"h": {...}, "J": [[u, v, J], ...]})
    #[arg(long, conflicts_with = "problem")]
    problem_file: Option<PathBuf>,

    /// Number of spins for generated problems
    #[arg(long)]
    size: Option<usize>,

    /// Random seed for generated couplings
    #[arg(long)]
    seed: Option<u64>,

    /// Qubit to grow generated problems from
    #[arg(long)]
    seed_qubit: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// List solvers visible to the configured token
    Solvers {
        /// Include hybrid and software solvers
        #[arg(long)]
        all: bool,
    },

    /// Show properties of the selected solver
    Properties {
        /// Print the raw properties as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build and check a reverse anneal schedule
    Schedule {
        /// Anneal fraction to ramp back to
        #[arg(short, long)]
        s_target: Option<f64>,

        /// Hold time at s_target (µs)
        #[arg(long)]
        hold_time: Option<f64>,

        /// Ramp-back slope (1/µs)
        #[arg(long)]
        ramp_back_slope: Option<f64>,

        /// Minimum anneal time of the solver (µs), bounding the slope
        #[arg(long, default_value = "0.5")]
        min_anneal_time: f64,
    },

    /// Forward anneal a problem
    Forward {
        #[command(flatten)]
        problem: ProblemArgs,

        /// Number of reads
        #[arg(short, long)]
        num_reads: Option<u32>,

        /// Anneal time (µs)
        #[arg(long)]
        anneal_time: Option<f64>,
    },

    /// Forward anneal, then reverse anneal from the best state with and
    /// without reinitialization
    Reverse {
        #[command(flatten)]
        problem: ProblemArgs,

        /// Anneal fraction to ramp back to
        #[arg(short, long)]
        s_target: Option<f64>,

        /// Number of reads per anneal
        #[arg(short, long)]
        num_reads: Option<u32>,

        /// Hold time at s_target (µs)
        #[arg(long)]
        hold_time: Option<f64>,

        /// Skip plots
        #[arg(long)]
        no_plots: bool,
    },

    /// Reverse anneal over a range of s_target values
    Sweep {
        #[command(flatten)]
        problem: ProblemArgs,

        /// Comma-separated s_target values
        #[arg(long, value_delimiter = ',')]
        s_targets: Option<Vec<f64>>,

        /// Number of reads per point
        #[arg(short, long)]
        num_reads: Option<u32>,

        /// Carry each read's final state into the next instead of restarting
        #[arg(long)]
        no_reinitialize: bool,

        /// Initial state JSON ({"0": 1, "4": -1}); a forward anneal otherwise
        #[arg(long)]
        initial_state: Option<PathBuf>,

        /// Skip plots
        #[arg(long)]
        no_plots: bool,
    },

    /// Statistics of a saved sample set
    Analyze {
        /// Sample set JSON written by forward, reverse or sweep
        sampleset: PathBuf,

        /// Problem JSON, for an exact ground-state reference
        #[arg(long)]
        problem_file: Option<PathBuf>,

        /// Ground-state energy, if known
        #[arg(long, conflicts_with = "problem_file")]
        ground_energy: Option<f64>,

        /// Initial state JSON, for distances from the starting state
        #[arg(long)]
        initial_state: Option<PathBuf>,

        /// Write an energy/Hamming plot here
        #[arg(long)]
        plot: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };
    if let Some(solver) = cli.solver {
        config.sapi.solver = Some(solver);
    }

    let tracing = TracingConfig::from_logging(&config.logging).with_verbosity(cli.verbose);
    if let Err(e) = init_tracing(tracing) {
        eprintln!("{} logging disabled: {}", style("Warning:").yellow().bold(), e);
    }

    let result = match cli.command {
        Commands::Solvers { all } => solvers::execute(&config, all).await,

        Commands::Properties { json } => properties::execute(&config, json).await,

        Commands::Schedule {
            s_target,
            hold_time,
            ramp_back_slope,
            min_anneal_time,
        } => schedule::execute(&config, s_target, hold_time, ramp_back_slope, min_anneal_time),

        Commands::Forward {
            problem,
            num_reads,
            anneal_time,
        } => forward::execute(&config, &problem, num_reads, anneal_time).await,

        Commands::Reverse {
            problem,
            s_target,
            num_reads,
            hold_time,
            no_plots,
        } => {
            reverse::execute(&config, &problem, s_target, num_reads, hold_time, !no_plots).await
        }

        Commands::Sweep {
            problem,
            s_targets,
            num_reads,
            no_reinitialize,
            initial_state,
            no_plots,
        } => {
            sweep::execute(
                &config,
                &problem,
                s_targets,
                num_reads,
                !no_reinitialize,
                initial_state.as_deref(),
                !no_plots,
            )
            .await
        }

        Commands::Analyze {
            sampleset,
            problem_file,
            ground_energy,
            initial_state,
            plot,
        } => analyze::execute(
            &config,
            &sampleset,
            problem_file.as_deref(),
            ground_energy,
            initial_state.as_deref(),
            plot.as_deref(),
        ),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

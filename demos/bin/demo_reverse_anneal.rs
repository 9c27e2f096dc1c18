//! Reverse Annealing Demo
//!
//! Walks through a reverse-annealing experiment on a D-Wave QPU: a forward
//! anneal finds a good state, then reverse anneals search around it.

use clap::Parser;

use revanneal_adapter_dwave::DWaveSampler;
use revanneal_demos::config::Config;
use revanneal_demos::problems::{ProblemKind, build_problem};
use revanneal_demos::runners::{ReverseAnnealExperiment, SweepRunner};
use revanneal_demos::tracing_config::init_default_tracing;
use revanneal_demos::{
    create_progress_bar, print_header, print_info, print_result, print_section, print_success,
    print_summary, print_warning,
};
use revanneal_hal::Sampler;
use revanneal_ir::AnnealSchedule;

#[derive(Parser, Debug)]
#[command(name = "demo-reverse-anneal")]
#[command(about = "Demonstrate reverse annealing from a forward-anneal solution")]
struct Args {
    /// Problem family
    #[arg(short, long, value_enum, default_value = "spin_glass")]
    problem: ProblemKind,

    /// Number of spins
    #[arg(long, default_value = "16")]
    size: usize,

    /// Anneal fraction to ramp back to
    #[arg(short, long, default_value = "0.45")]
    s_target: f64,

    /// Reads per anneal
    #[arg(short, long, default_value = "100")]
    num_reads: u32,

    /// Also sweep s_target from 0.3 to 0.7
    #[arg(long)]
    sweep: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let _ = init_default_tracing();

    print_header("Reverse Annealing Demo");

    let config = match Config::load(None) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };
    let dwave = match config.dwave_config() {
        Ok(dwave) => dwave,
        Err(e) => {
            eprintln!("{e}. Set DWAVE_API_TOKEN to run this demo.");
            std::process::exit(1);
        }
    };

    print_section("Solver");
    let sampler = match DWaveSampler::connect(dwave).await {
        Ok(sampler) => sampler,
        Err(e) => {
            eprintln!("Failed to connect: {e}");
            std::process::exit(1);
        }
    };
    for (label, value) in sampler.properties().summary() {
        print_result(&label, value);
    }
    if !sampler.properties().supports_reverse_anneal() {
        print_warning("this solver does not list the reverse-anneal parameters");
    }

    print_section("Problem Setup");
    let model = match build_problem(args.problem, sampler.properties(), args.size, None, 42) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Failed to build problem: {e}");
            std::process::exit(1);
        }
    };
    print_result("Problem", args.problem);
    print_result("Spins", model.num_variables());
    print_result("Couplers", model.num_interactions());

    print_section("Reverse Annealing");
    println!("  A forward anneal starts in a superposition at s = 0 and ends");
    println!("  in a classical state at s = 1. A reverse anneal starts from a");
    println!("  classical state at s = 1, ramps back to s_target, holds, and");
    println!("  anneals forward again.");
    println!();
    println!("  reinitialize_state = true  restarts every read from the given state");
    println!("  reinitialize_state = false starts each read where the last ended");

    let experiment = ReverseAnnealExperiment::new(args.s_target)
        .with_num_reads(args.num_reads)
        .with_hold_time(config.experiment.hold_time)
        .with_label("demo-reverse-anneal");
    match AnnealSchedule::reverse(&experiment.schedule_for(&sampler)) {
        Ok(schedule) => print_result("Schedule", schedule),
        Err(e) => {
            eprintln!("Invalid schedule: {e}");
            std::process::exit(1);
        }
    }

    print_section("Running");
    let pb = create_progress_bar(3, "forward + 2 reverse anneals");
    let result = experiment.run(&sampler, &model).await;
    pb.finish_and_clear();
    let result = match result {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Experiment failed: {e}");
            std::process::exit(1);
        }
    };

    print_result("Initial state energy", format!("{:.4}", result.initial_energy));
    print_result("Ground energy", format!("{:.4}", result.ground_energy));
    println!();
    for summary in result.summaries() {
        print_summary(summary);
        println!();
    }

    match result.write_outputs(&config.output.directory, config.output.plots) {
        Ok(paths) => {
            for path in paths {
                print_success(&format!("Wrote {}", path.display()));
            }
        }
        Err(e) => print_warning(&format!("could not write results: {e}")),
    }

    if args.sweep {
        print_section("s_target Sweep");
        let runner = SweepRunner::new(SweepRunner::linspace(0.3, 0.7, 9))
            .with_num_reads(args.num_reads)
            .with_schedule(config.experiment.schedule(args.s_target));
        let pb = create_progress_bar(runner.s_targets.len() as u64, "reverse anneals");
        let sweep = runner
            .run(&sampler, &model, &result.initial_state, Some(&pb))
            .await;
        pb.finish_and_clear();
        match sweep {
            Ok(sweep) => {
                for point in &sweep.points {
                    print_result(
                        &format!("s_target {:.2}", point.s_target),
                        format!("ratio {:.3}, mean energy {:.4}", point.ratio, point.stats.mean),
                    );
                }
                if let Some(best) = sweep.best() {
                    print_success(&format!("Best s_target {} (ratio {:.3})", best.s_target, best.ratio));
                }
            }
            Err(e) => print_warning(&format!("sweep failed: {e}")),
        }
    }

    print_section("Summary");
    print_info("Reverse annealing refines a known state rather than starting over.");
    print_info("Lower s_target explores further from the initial state.");
}

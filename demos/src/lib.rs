//! revanneal demo suite
//!
//! Problem generators, experiment runners and the shared plumbing of the
//! `revanneal` CLI and the `demo-reverse-anneal` walkthrough:
//!
//! - [`problems`]: Ising instances placed on a solver's working graph
//! - [`runners`]: forward/reverse experiments and `s_target` sweeps
//! - [`config`]: YAML + environment configuration
//! - [`tracing_config`]: console or JSON logging
//!
//! # Example
//!
//! ```ignore
//! use revanneal_adapter_dwave::DWaveSampler;
//! use revanneal_demos::problems::{ProblemKind, build_problem};
//! use revanneal_demos::runners::ReverseAnnealExperiment;
//! use revanneal_hal::Sampler;
//!
//! let sampler = DWaveSampler::from_env().await?;
//! let model = build_problem(ProblemKind::SpinGlass, sampler.properties(), 16, None, 42)?;
//! let result = ReverseAnnealExperiment::new(0.45).run(&sampler, &model).await?;
//! println!("{:?}", result.reverse_reinitialize.ground_state_ratio);
//! ```

pub mod config;
pub mod problems;
pub mod runners;
pub mod tracing_config;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use revanneal_stats::RunSummary;

/// Create a progress bar for demo operations.
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let template = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
    let style = ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Print a demo header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!("{}", style(format!("  {title}")).cyan().bold());
    println!("{}", style("═".repeat(60)).cyan());
    println!();
}

/// Print a demo section.
pub fn print_section(title: &str) {
    println!();
    println!("{}", style(format!("▶ {title}")).green().bold());
    println!("{}", style("─".repeat(40)).dim());
}

/// Print a result line.
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("ℹ").blue(), message);
}

/// Print a warning.
pub fn print_warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// Print the statistics of one run.
pub fn print_summary(summary: &RunSummary) {
    println!("  {}", style(&summary.label).bold());
    for (label, value) in summary.report_lines() {
        print_result(&format!("  {label}"), value);
    }
}

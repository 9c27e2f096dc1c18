//! Schedule command implementation.

use anyhow::{Context, Result};
use console::style;

use revanneal_demos::config::Config;
use revanneal_demos::print_result;
use revanneal_demos::runners::fit_ramp_up;
use revanneal_ir::{AnnealSchedule, ScheduleLimits};

/// Execute the schedule command.
pub fn execute(
    config: &Config,
    s_target: Option<f64>,
    hold_time: Option<f64>,
    ramp_back_slope: Option<f64>,
    min_anneal_time: f64,
) -> Result<()> {
    let exp = &config.experiment;
    let mut spec = exp.schedule(s_target.unwrap_or(exp.s_target));
    if let Some(hold) = hold_time {
        spec = spec.with_hold_time(hold);
    }
    if let Some(slope) = ramp_back_slope {
        spec = spec.with_ramp_back_slope(slope);
    }

    let limits = ScheduleLimits {
        min_anneal_time_us: min_anneal_time,
        ..ScheduleLimits::default()
    };
    let spec = fit_ramp_up(spec, &limits);

    let schedule = AnnealSchedule::reverse(&spec).context("Invalid reverse schedule")?;

    println!(
        "{} Reverse schedule to s = {}",
        style("→").cyan().bold(),
        style(spec.s_target).green()
    );
    println!();
    println!("  {:>10}  {:>8}", style("t (µs)").bold(), style("s").bold());
    for point in schedule.points() {
        println!("  {:>10.4}  {:>8.4}", point.time_us, point.s);
    }
    println!();
    print_result("Breakpoints", schedule.len());
    print_result("Duration", format!("{:.4} µs", schedule.duration()));
    if let Some(kind) = schedule.kind() {
        print_result("Kind", format!("{kind:?}"));
    }

    schedule
        .validate(&limits)
        .with_context(|| format!("Schedule violates limits (max slope {:.2}/µs)", limits.max_slope()))?;
    println!(
        "{} Within limits: {} points, slope ≤ {:.2}/µs, ≤ {} µs",
        style("✓").green().bold(),
        limits.max_points,
        limits.max_slope(),
        limits.max_anneal_time_us
    );

    Ok(())
}

//! SVG plots of runs and sweeps.

use std::ops::Range;
use std::path::Path;

use plotters::prelude::*;
use tracing::debug;

use crate::error::{StatsError, StatsResult};
use crate::summary::{RunSummary, SweepResult};

const WIDTH: u32 = 1024;
const PANEL_HEIGHT: u32 = 384;

fn plot_err(e: impl std::fmt::Display) -> StatsError {
    StatsError::Plot(e.to_string())
}

/// Axis range around `[min, max]` with a margin, never empty.
fn padded(min: f64, max: f64) -> Range<f64> {
    let span = max - min;
    let pad = if span > 0.0 { span * 0.05 } else { 0.5 };
    (min - pad)..(max + pad)
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Energy per read (top panel) and Hamming distance per read (bottom
/// panel), one line per run.
///
/// The Hamming panel shows distance from the initial state where a run has
/// one, else distance between consecutive reads.
pub fn plot_energy_and_hamming(path: &Path, runs: &[&RunSummary]) -> StatsResult<()> {
    let energy_bounds = bounds(runs.iter().flat_map(|r| r.energies.iter().copied()))
        .ok_or(StatsError::Empty)?;
    let max_reads = runs.iter().map(|r| r.energies.len()).max().unwrap_or(1).max(2);
    let max_distance = runs
        .iter()
        .flat_map(|r| r.hamming_for_plot().iter().copied())
        .max()
        .unwrap_or(0);

    let root = SVGBackend::new(path, (WIDTH, PANEL_HEIGHT * 2)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let (upper, lower) = root.split_vertically(PANEL_HEIGHT);

    let mut energy_chart = ChartBuilder::on(&upper)
        .caption("Energy per read", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..(max_reads - 1) as f64, padded(energy_bounds.0, energy_bounds.1))
        .map_err(plot_err)?;
    energy_chart
        .configure_mesh()
        .x_desc("read")
        .y_desc("energy")
        .draw()
        .map_err(plot_err)?;

    let mut hamming_chart = ChartBuilder::on(&lower)
        .caption("Hamming distance per read", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..(max_reads - 1) as f64, padded(0.0, max_distance as f64))
        .map_err(plot_err)?;
    hamming_chart
        .configure_mesh()
        .x_desc("read")
        .y_desc("distance")
        .draw()
        .map_err(plot_err)?;

    for (i, run) in runs.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();

        energy_chart
            .draw_series(LineSeries::new(
                run.energies.iter().enumerate().map(|(x, &e)| (x as f64, e)),
                color.stroke_width(1),
            ))
            .map_err(plot_err)?
            .label(run.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

        // Consecutive distances start at the second read.
        let offset = if run.hamming_from_initial.is_some() { 0 } else { 1 };
        hamming_chart
            .draw_series(LineSeries::new(
                run.hamming_for_plot()
                    .iter()
                    .enumerate()
                    .map(|(x, &d)| ((x + offset) as f64, d as f64)),
                color.stroke_width(1),
            ))
            .map_err(plot_err)?
            .label(run.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    for chart in [&mut energy_chart, &mut hamming_chart] {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    debug!("wrote {}", path.display());
    Ok(())
}

/// Ground-state ratio against `s_target`.
pub fn plot_sweep(path: &Path, sweep: &SweepResult) -> StatsResult<()> {
    let (s_min, s_max) =
        bounds(sweep.points.iter().map(|p| p.s_target)).ok_or(StatsError::Empty)?;

    let root = SVGBackend::new(path, (WIDTH, PANEL_HEIGHT * 2)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let caption = format!(
        "Ground-state ratio vs s_target (reinitialize_state = {})",
        sweep.reinitialize_state
    );
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(padded(s_min, s_max), 0f64..1.05)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("s_target")
        .y_desc("ground-state ratio")
        .draw()
        .map_err(plot_err)?;

    let points: Vec<(f64, f64)> = sweep.points.iter().map(|p| (p.s_target, p.ratio)).collect();
    chart
        .draw_series(LineSeries::new(points.iter().copied(), BLUE.stroke_width(2)))
        .map_err(plot_err)?;
    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 4, BLUE.filled())))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    debug!("wrote {}", path.display());
    Ok(())
}

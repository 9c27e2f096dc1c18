//! Solvers command implementation.

use anyhow::{Context, Result};
use console::style;

use revanneal_adapter_dwave::SapiClient;
use revanneal_demos::config::Config;

/// Execute the solvers command.
pub async fn execute(config: &Config, all: bool) -> Result<()> {
    let dwave = config.dwave_config()?;
    let client = SapiClient::with_timeouts(
        &dwave.endpoint,
        &dwave.token,
        dwave.request_timeout,
        dwave.connect_timeout,
    )?;

    let solvers = client
        .list_solvers()
        .await
        .context("Failed to list solvers")?;

    println!("{} Solvers at {}:\n", style("revanneal").cyan().bold(), client.endpoint());

    let mut shown = 0;
    for solver in solvers.iter().filter(|s| all || s.is_qpu()) {
        shown += 1;
        println!(
            "  {} {}{}",
            if solver.is_online() {
                style("●").green()
            } else {
                style("○").red()
            },
            style(&solver.id).bold(),
            solver
                .properties
                .category
                .as_deref()
                .map(|c| format!(" ({c})"))
                .unwrap_or_default()
        );
        if solver.is_qpu() {
            println!(
                "    Qubits: {} working of {}",
                solver.properties.qubits.len(),
                solver.properties.num_qubits
            );
            println!(
                "    Reverse annealing: {}",
                if solver.properties.supports_reverse_anneal() { "yes" } else { "no" }
            );
        }
        if let Some(load) = solver.avg_load {
            println!("    Load: {:.0}%", load * 100.0);
        }
        println!();
    }

    if shown == 0 {
        println!("  No QPU solvers visible; use --all to include other solvers");
    }
    Ok(())
}

//! Properties command implementation.

use anyhow::Result;
use console::style;

use revanneal_demos::config::Config;
use revanneal_demos::{print_result, print_section};
use revanneal_hal::Sampler;

use super::common::connect;

/// Execute the properties command.
pub async fn execute(config: &Config, json: bool) -> Result<()> {
    let sampler = connect(config).await?;
    let properties = sampler.properties();

    if json {
        println!("{}", serde_json::to_string_pretty(properties)?);
        return Ok(());
    }

    print_section(&format!("Properties of {}", sampler.name()));
    for (label, value) in properties.summary() {
        print_result(&label, value);
    }

    let limits = properties.schedule_limits();
    print_result("Max schedule slope (1/µs)", format!("{:.3}", limits.max_slope()));

    let availability = sampler.availability().await?;
    println!();
    if availability.is_available {
        println!(
            "  {} online{}",
            style("●").green(),
            availability
                .load
                .map(|l| format!(", load {:.0}%", l * 100.0))
                .unwrap_or_default()
        );
    } else {
        println!(
            "  {} {}",
            style("○").red(),
            availability.status_message.unwrap_or_else(|| "unavailable".into())
        );
    }
    Ok(())
}

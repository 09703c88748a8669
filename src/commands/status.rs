use anyhow::Result;
use chrono::Utc;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Table};

use crate::commands::colorize_state;
use crate::orchestrator::OrchestrationCore;

/// Probe every registered unit and render a status table. Each row is a
/// fresh observation -- there is no cached state to go stale.
pub async fn run(core: &OrchestrationCore, json: bool) -> Result<()> {
    let units: Vec<_> = core
        .registry()
        .all_units()
        .map(|u| (u.name.clone(), u.kind, u.port))
        .collect();

    let batch = core.health_all().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(["UNIT", "KIND", "PORT", "STATE"]);

    for ((name, kind, port), outcome) in units.iter().zip(&batch.outcomes) {
        table.add_row([
            Cell::new(name),
            Cell::new(kind.to_string()),
            Cell::new(port.to_string()),
            Cell::new(colorize_state(outcome.state)),
        ]);
    }

    println!("stackrig status at {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    println!("{table}");
    println!("{} of {} units up", batch.succeeded, batch.total());
    Ok(())
}

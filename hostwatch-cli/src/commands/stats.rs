//! Target statistics command.

use crate::error::CliError;
use crate::util::{Context, print_json};

/// Show target statistics
pub fn cmd_stats(ctx: &Context, json: bool) -> Result<(), CliError> {
    let hub = ctx.hostwatch(None)?;
    let stats = hub.get_stats();

    if json {
        return print_json(&stats);
    }

    let settings = hub.settings();

    println!("Hostwatch Statistics");
    println!("====================\n");

    println!("Targets:             {}", stats.total_targets);
    println!("Active connections:  {}", stats.active_connections);
    println!("Active monitoring:   {}", stats.active_monitoring);

    let watched: usize = stats.targets.iter().map(|t| t.services.len()).sum();
    println!("Watched services:    {watched}");

    println!("\nSettings:");
    println!("  Interval:        {} min", settings.effective_interval_minutes());
    println!("  Process limit:   {}", settings.effective_process_limit());
    println!("  Journal lines:   {}", settings.effective_error_log_lines());
    println!("  Exec timeout:    {}s", settings.exec_timeout().as_secs());
    println!("  Connect timeout: {}s", settings.connect_timeout().as_secs());

    Ok(())
}

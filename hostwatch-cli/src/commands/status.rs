//! Health snapshot command.

use hostwatch_core::ServerStatus;

use crate::error::CliError;
use crate::util::{Context, Palette, print_json, runtime};

/// Usage above this is highlighted
const HIGHLIGHT_PERCENT: f64 = 80.0;

/// Status command handler
pub fn cmd_status(ctx: &Context, target: &str, json: bool) -> Result<(), CliError> {
    let hub = ctx.hostwatch(None)?;

    let status = runtime()?.block_on(async {
        let status = hub.get_status(target).await;
        hub.disconnect_all().await;
        status
    })?;

    if json {
        return print_json(&status);
    }
    print_status(&status, ctx.palette);
    Ok(())
}

/// Prints a status block, highlighting high usage
pub fn print_status(status: &ServerStatus, palette: Palette) {
    let (bold, reset) = (palette.bold(), palette.reset());
    println!("{bold}{}{reset} ({})", status.target_name, status.uptime);

    for (label, value) in [
        ("CPU", status.cpu_percent),
        ("Memory", status.mem_percent),
        ("Disk", status.disk_percent),
    ] {
        let color = if value > HIGHLIGHT_PERCENT {
            palette.red()
        } else {
            palette.green()
        };
        println!("  {label:<7} {color}{value:>5.1}%{reset}");
    }

    if status.healthy {
        println!("  {}Healthy{reset}", palette.green());
    } else {
        println!("  {}{bold}Unhealthy{reset}", palette.red());
    }
}

//! List targets command.

use hostwatch_core::TargetSummary;

use crate::error::CliError;
use crate::util::{Context, Palette, print_json};

/// List targets command handler
pub fn cmd_list(ctx: &Context, json: bool) -> Result<(), CliError> {
    let hub = ctx.hostwatch(None)?;
    let targets = hub.list_targets();

    if json {
        return print_json(&targets);
    }

    if targets.is_empty() {
        println!("No targets configured.");
        return Ok(());
    }

    print_table(&targets, ctx.palette);
    Ok(())
}

fn print_table(targets: &[TargetSummary], palette: Palette) {
    let name_width = targets
        .iter()
        .map(|t| t.name.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let host_width = targets
        .iter()
        .map(|t| t.host.len() + t.port.to_string().len() + 1)
        .max()
        .unwrap_or(4)
        .max(4);

    println!(
        "{bold}{:<name_width$}  {:<host_width$}  {:<12}  SERVICES{reset}",
        "NAME",
        "HOST",
        "USER",
        bold = palette.bold(),
        reset = palette.reset()
    );
    for t in targets {
        let services = if t.services.is_empty() {
            "-".to_string()
        } else {
            t.services.join(", ")
        };
        println!(
            "{:<name_width$}  {:<host_width$}  {:<12}  {services}",
            t.name,
            format!("{}:{}", t.host, t.port),
            t.username,
        );
    }
}

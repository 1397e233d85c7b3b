//! Recent journal errors command.

use crate::error::CliError;
use crate::util::{Context, runtime};

/// Errors command handler
pub fn cmd_errors(ctx: &Context, target: &str, lines: u32) -> Result<(), CliError> {
    let hub = ctx.hostwatch(None)?;

    let summary = runtime()?.block_on(async {
        let summary = hub.get_recent_errors(target, Some(lines)).await;
        hub.disconnect_all().await;
        summary
    });

    if let Some(error) = summary.error {
        return Err(CliError::Connection(error));
    }

    println!("{} error entries in the last {lines} journal lines", summary.count);
    for line in &summary.samples {
        println!("  {line}");
    }
    Ok(())
}

//! Top processes command.

use crate::error::CliError;
use crate::util::{Context, runtime};

/// Processes command handler
pub fn cmd_processes(ctx: &Context, target: &str, limit: usize) -> Result<(), CliError> {
    let hub = ctx.hostwatch(None)?;

    let processes = runtime()?.block_on(async {
        let processes = hub.get_processes(target, Some(limit)).await;
        hub.disconnect_all().await;
        processes
    })?;

    let palette = ctx.palette;
    println!(
        "{}{:<12} {:>8} {:>6} {:>6}  COMMAND{}",
        palette.bold(),
        "USER",
        "PID",
        "%CPU",
        "%MEM",
        palette.reset()
    );
    for p in &processes {
        println!(
            "{:<12} {:>8} {:>6.1} {:>6.1}  {}",
            p.user, p.pid, p.cpu_percent, p.mem_percent, p.command
        );
    }
    Ok(())
}

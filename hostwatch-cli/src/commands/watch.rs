//! Continuous monitoring until Ctrl-C.

use std::path::Path;

use crate::error::CliError;
use crate::util::{Context, runtime};

/// Watch command handler
pub fn cmd_watch(
    ctx: &Context,
    targets: &[String],
    interval_minutes: Option<u32>,
    notify_cmd: Option<&Path>,
) -> Result<(), CliError> {
    let hub = ctx.hostwatch(notify_cmd)?;

    let targets: Vec<String> = if targets.is_empty() {
        hub.registry().names().into_iter().map(ToString::to_string).collect()
    } else {
        targets.to_vec()
    };
    if targets.is_empty() {
        return Err(CliError::Config("No targets configured".to_string()));
    }

    runtime()?.block_on(async {
        for target in &targets {
            if let Err(e) = hub.start_monitoring(target, interval_minutes) {
                hub.shutdown().await;
                return Err(CliError::from(e));
            }
        }

        for info in hub.monitoring() {
            println!(
                "Monitoring {} every {} min",
                info.target_name, info.interval_minutes
            );
        }
        println!("Press Ctrl-C to stop.");

        let signal = tokio::signal::ctrl_c().await;
        hub.shutdown().await;
        println!("Stopped monitoring {} target(s).", targets.len());
        signal.map_err(CliError::from)
    })
}

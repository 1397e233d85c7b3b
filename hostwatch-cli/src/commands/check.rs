//! One-shot monitoring tick.

use std::path::Path;

use hostwatch_core::MonitorReport;

use crate::commands::status::print_status;
use crate::error::CliError;
use crate::util::{Context, print_json, runtime};

/// Check command handler
///
/// A degraded report is still printed, then reported as a connection failure.
pub fn cmd_check(
    ctx: &Context,
    target: &str,
    json: bool,
    notify_cmd: Option<&Path>,
) -> Result<(), CliError> {
    let hub = ctx.hostwatch(notify_cmd)?;
    if !hub.registry().contains(target) {
        return Err(CliError::TargetNotFound(target.to_string()));
    }

    let report = runtime()?.block_on(async {
        let report = hub.monitor_server(target).await;
        hub.disconnect_all().await;
        report
    });

    if json {
        print_json(&report)?;
    } else {
        print_report(&report, ctx);
    }

    if report.is_degraded() {
        let reason = report
            .alerts
            .first()
            .map_or_else(|| "monitoring failed".to_string(), |a| a.message.clone());
        return Err(CliError::Connection(reason));
    }
    Ok(())
}

fn print_report(report: &MonitorReport, ctx: &Context) {
    let palette = ctx.palette;
    if let Some(ref status) = report.status {
        print_status(status, palette);
    }

    if !report.services.is_empty() {
        let down = report.services.iter().filter(|s| !s.active).count();
        println!(
            "  Services {}/{} active",
            report.services.len() - down,
            report.services.len()
        );
    }
    if let Some(ref errors) = report.errors {
        println!("  Journal errors: {}", errors.count);
    }

    if report.alerts.is_empty() {
        println!("{}No alerts{}", palette.green(), palette.reset());
        return;
    }
    println!("{}Alerts:{}", palette.bold(), palette.reset());
    for alert in &report.alerts {
        println!("  {} {}", alert.level.icon(), alert.message);
    }
}

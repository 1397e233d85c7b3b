//! Watched services command.

use crate::error::CliError;
use crate::util::{Context, runtime};

/// Services command handler
pub fn cmd_services(ctx: &Context, target: &str) -> Result<(), CliError> {
    let hub = ctx.hostwatch(None)?;

    let services = runtime()?.block_on(async {
        let services = hub.check_services(target).await;
        hub.disconnect_all().await;
        services
    })?;

    if services.is_empty() {
        println!("No watched services for {target}.");
        return Ok(());
    }

    let palette = ctx.palette;
    for s in &services {
        if s.active {
            println!("{}✓{} {}", palette.green(), palette.reset(), s.service);
        } else {
            let detail = s
                .error
                .as_deref()
                .or(s.status.as_deref())
                .unwrap_or("unknown");
            println!(
                "{}✗{} {} {}- {detail}{}",
                palette.red(),
                palette.reset(),
                s.service,
                palette.yellow(),
                palette.reset()
            );
        }
    }
    Ok(())
}

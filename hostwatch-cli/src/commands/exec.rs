//! Remote command execution.

use std::time::Duration;

use hostwatch_core::CommandResult;

use crate::error::CliError;
use crate::util::{Context, runtime};

/// Run a command and mirror its output
pub fn cmd_exec(
    ctx: &Context,
    target: &str,
    command: &str,
    timeout_ms: Option<u64>,
) -> Result<(), CliError> {
    let hub = ctx.hostwatch(None)?;
    let timeout = timeout_ms.map(Duration::from_millis);

    let result = runtime()?.block_on(async {
        let result = hub.exec(target, command, timeout).await;
        hub.disconnect_all().await;
        result
    })?;

    report_result(&result)
}

/// Prints captured output and maps a failed command to exit code 3
pub fn report_result(result: &CommandResult) -> Result<(), CliError> {
    if !result.stdout.is_empty() {
        println!("{}", result.stdout);
    }
    if !result.stderr.is_empty() {
        eprintln!("{}", result.stderr);
    }

    if result.success {
        return Ok(());
    }
    let reason = match (&result.signal, result.exit_code) {
        (Some(signal), _) => format!("killed by signal {signal}"),
        (None, Some(code)) => format!("exit status {code}"),
        (None, None) => "no exit status".to_string(),
    };
    Err(CliError::RemoteFailed(reason))
}

//! Upload-and-run of a local script.

use std::path::Path;

use crate::commands::exec::report_result;
use crate::error::CliError;
use crate::util::{Context, runtime, script_label};

/// Script command handler
pub fn cmd_script(ctx: &Context, target: &str, file: &Path) -> Result<(), CliError> {
    let content = std::fs::read_to_string(file)?;
    let label = script_label(file);
    let hub = ctx.hostwatch(None)?;

    let result = runtime()?.block_on(async {
        let result = hub.exec_script(target, &content, Some(&label)).await;
        hub.disconnect_all().await;
        result
    })?;

    report_result(&result)
}

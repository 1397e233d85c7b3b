//! Command handler modules for the CLI.

mod check;
mod completions;
mod errors;
mod exec;
mod list;
mod processes;
mod script;
mod services;
mod stats;
mod status;
mod watch;

use crate::cli::Commands;
use crate::error::CliError;
use crate::util::Context;

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(ctx: &Context, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::List { json } => list::cmd_list(ctx, json),
        Commands::Stats { json } => stats::cmd_stats(ctx, json),
        Commands::Exec {
            target,
            command,
            timeout_ms,
        } => exec::cmd_exec(ctx, &target, &command.join(" "), timeout_ms),
        Commands::Script { target, file } => script::cmd_script(ctx, &target, &file),
        Commands::Status { target, json } => status::cmd_status(ctx, &target, json),
        Commands::Processes { target, limit } => processes::cmd_processes(ctx, &target, limit),
        Commands::Services { target } => services::cmd_services(ctx, &target),
        Commands::Errors { target, lines } => errors::cmd_errors(ctx, &target, lines),
        Commands::Check {
            target,
            json,
            notify_cmd,
        } => check::cmd_check(ctx, &target, json, notify_cmd.as_deref()),
        Commands::Watch {
            targets,
            interval_minutes,
            notify_cmd,
        } => watch::cmd_watch(ctx, &targets, interval_minutes, notify_cmd.as_deref()),
        Commands::Completions { shell } => completions::cmd_completions(shell),
    }
}

//! `Hostwatch` CLI - run commands on and monitor remote hosts over SSH
//!
//! Targets come from a TOML file (`--config`) or from `SSH_*` environment
//! variables, optionally loaded from a `.env` file.

mod cli;
mod commands;
mod error;
mod util;

use clap::Parser;
use cli::Cli;
use hostwatch_core::tracing::{TracingConfig, TracingLevel, init_tracing};

use crate::util::{Context, Palette};

fn main() {
    // A missing .env is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let tracing_config = TracingConfig::default()
        .with_level(TracingLevel::from_verbosity(cli.verbose, cli.quiet))
        .with_ansi(!cli.no_color);
    if let Err(e) = init_tracing(&tracing_config) {
        eprintln!("Warning: {e}");
    }

    let ctx = Context {
        config_path: cli.config,
        palette: Palette::new(!cli.no_color),
    };

    if let Err(e) = commands::dispatch(&ctx, cli.command) {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}

//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// `Hostwatch` command-line interface for remote hosts
#[derive(Parser)]
#[command(name = "hostwatch")]
#[command(author, version, about = "Run commands on and monitor remote hosts over SSH")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a `hostwatch.toml` file (defaults to SSH_* environment variables)
    #[arg(short, long, global = true, env = "HOSTWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List configured targets
    #[command(about = "List configured targets")]
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show target and session counters
    #[command(about = "Show target, connection and monitoring counters")]
    Stats {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run a command on a target
    #[command(about = "Run a shell command on a target")]
    Exec {
        /// Target name
        target: String,

        /// Command line, joined with spaces
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,

        /// Timeout in milliseconds (defaults to the configured exec timeout)
        #[arg(short, long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },

    /// Upload and run a local script on a target
    #[command(about = "Upload a local script to a target, run it and remove it")]
    Script {
        /// Target name
        target: String,

        /// Local script file
        file: PathBuf,
    },

    /// Show CPU, memory, disk and uptime
    #[command(about = "Show a health snapshot of a target")]
    Status {
        /// Target name
        target: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the top processes by CPU
    #[command(about = "Show the top processes by CPU usage")]
    Processes {
        /// Target name
        target: String,

        /// Number of processes
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show watched service states
    #[command(about = "Show the state of the target's watched services")]
    Services {
        /// Target name
        target: String,
    },

    /// Show recent journal errors
    #[command(about = "Summarize recent error entries from the journal")]
    Errors {
        /// Target name
        target: String,

        /// Number of journal lines to scan
        #[arg(short, long, default_value = "50")]
        lines: u32,
    },

    /// Run one monitoring tick
    #[command(about = "Run one monitoring tick and send alerts if any")]
    Check {
        /// Target name
        target: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Deliver alerts by running this program (title and summary as
        /// arguments, HTML on stdin)
        #[arg(long, value_name = "PROGRAM")]
        notify_cmd: Option<PathBuf>,
    },

    /// Monitor targets until interrupted
    #[command(about = "Monitor targets periodically until Ctrl-C")]
    Watch {
        /// Targets to monitor (all configured targets when omitted)
        targets: Vec<String>,

        /// Polling interval in minutes (1-1440)
        #[arg(short, long, value_name = "MINUTES")]
        interval_minutes: Option<u32>,

        /// Deliver alerts by running this program (title and summary as
        /// arguments, HTML on stdin)
        #[arg(long, value_name = "PROGRAM")]
        notify_cmd: Option<PathBuf>,
    },

    /// Generate shell completions
    #[command(about = "Generate shell completions for bash, zsh, fish, etc.")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

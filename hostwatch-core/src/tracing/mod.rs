//! Log subscriber for the `hostwatch` binary
//!
//! The library only emits events: sessions, commands and monitoring ticks log
//! with `target_name` and friends as structured fields. The binary installs
//! one fmt subscriber here before dispatching a command. Output defaults to
//! stderr because stdout carries command results and JSON.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Subscriber installation failure
#[derive(Debug, Error)]
pub enum TracingError {
    /// The filter directive was rejected or another subscriber won the race
    #[error("Failed to initialize tracing: {0}")]
    InitializationFailed(String),

    /// `init_tracing` ran before
    #[error("Tracing has already been initialized")]
    AlreadyInitialized,
}

/// Result type for subscriber setup
pub type TracingResult<T> = Result<T, TracingError>;

/// Verbosity of the `hostwatch` crates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingLevel {
    /// Failures the user must see
    Error,
    /// Dropped sessions, failed probes and undelivered alerts
    #[default]
    Warn,
    /// Sessions opened and closed, loops started, alerts sent
    Info,
    /// Every remote command and parsed probe value
    Debug,
    /// Transport internals
    Trace,
}

impl TracingLevel {
    /// Maps `-v` repetitions; `--quiet` wins over any count
    #[must_use]
    pub const fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Error;
        }
        match verbose {
            0 => Self::Warn,
            1 => Self::Info,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// `EnvFilter` level name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Directive that scopes the level to the core library and the binary
    #[must_use]
    pub fn directive(self) -> String {
        format!("hostwatch_core={0},hostwatch={0}", self.as_str())
    }
}

impl std::fmt::Display for TracingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingOutput {
    /// Standard output
    Stdout,
    /// Standard error
    #[default]
    Stderr,
}

/// How the binary's subscriber is built
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for the hostwatch crates
    pub level: TracingLevel,
    /// Destination stream
    pub output: TracingOutput,
    /// Raw `EnvFilter` directive used instead of `level`
    pub filter: Option<String>,
    /// Colored level names
    pub ansi: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: TracingLevel::default(),
            output: TracingOutput::default(),
            filter: None,
            ansi: true,
        }
    }
}

impl TracingConfig {
    /// Sets the level
    #[must_use]
    pub const fn with_level(mut self, level: TracingLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the destination
    #[must_use]
    pub const fn with_output(mut self, output: TracingOutput) -> Self {
        self.output = output;
        self
    }

    /// Overrides the level with a raw directive
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Enables or disables colors
    #[must_use]
    pub const fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// `RUST_LOG` first, then the explicit directive, then the level
    fn build_filter(&self) -> TracingResult<EnvFilter> {
        if let Ok(from_env) = EnvFilter::try_from_default_env() {
            return Ok(from_env);
        }
        let directive = self
            .filter
            .clone()
            .unwrap_or_else(|| self.level.directive());
        EnvFilter::try_new(&directive)
            .map_err(|e| TracingError::InitializationFailed(format!("{directive}: {e}")))
    }
}

/// Installs the process-wide subscriber described by `config`
///
/// # Errors
///
/// `AlreadyInitialized` when called twice; `InitializationFailed` for a bad
/// filter directive or when some other subscriber is already global.
pub fn init_tracing(config: &TracingConfig) -> TracingResult<()> {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Err(TracingError::AlreadyInitialized);
    }

    let filter = config.build_filter()?;
    let fmt = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(config.ansi);
    let installed = match config.output {
        TracingOutput::Stderr => tracing_subscriber::registry()
            .with(filter)
            .with(fmt.with_writer(std::io::stderr))
            .try_init(),
        TracingOutput::Stdout => tracing_subscriber::registry()
            .with(filter)
            .with(fmt.with_writer(std::io::stdout))
            .try_init(),
    };
    installed.map_err(|e| TracingError::InitializationFailed(e.to_string()))?;

    tracing::debug!(level = %config.level, output = ?config.output, "Logging ready");
    Ok(())
}

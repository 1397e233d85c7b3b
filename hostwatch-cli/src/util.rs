//! Shared utility functions used across command modules.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hostwatch_core::{
    CommandNotifier, ConfigProvider, EnvConfigProvider, FileConfigProvider, Hostwatch, Notifier,
    TracingNotifier,
};

use crate::error::CliError;

/// ANSI styling, disabled by `--no-color`
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    const fn pick(self, code: &'static str) -> &'static str {
        if self.enabled { code } else { "" }
    }

    pub const fn green(self) -> &'static str {
        self.pick("\x1b[32m")
    }

    pub const fn red(self) -> &'static str {
        self.pick("\x1b[31m")
    }

    pub const fn yellow(self) -> &'static str {
        self.pick("\x1b[33m")
    }

    pub const fn bold(self) -> &'static str {
        self.pick("\x1b[1m")
    }

    pub const fn reset(self) -> &'static str {
        self.pick("\x1b[0m")
    }
}

/// Global options every command handler receives
#[derive(Debug, Clone)]
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub palette: Palette,
}

impl Context {
    /// Provider for `--config`, or the `SSH_*` environment variables
    pub fn provider(&self) -> Box<dyn ConfigProvider> {
        match self.config_path {
            Some(ref path) => Box::new(FileConfigProvider::new(path)),
            None => Box::new(EnvConfigProvider::new()),
        }
    }

    /// Builds the facade with the given alert program, or log-only alerts
    pub fn hostwatch(&self, notify_cmd: Option<&Path>) -> Result<Hostwatch, CliError> {
        let notifier: Arc<dyn Notifier> = match notify_cmd {
            Some(program) => Arc::new(CommandNotifier::new(program)),
            None => Arc::new(TracingNotifier),
        };
        let provider = self.provider();
        tracing::debug!(source = %provider.describe(), "Loading configuration");
        Ok(Hostwatch::from_provider(provider.as_ref(), notifier)?)
    }
}

/// Creates the runtime a command runs on
pub fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Connection(format!("Failed to create async runtime: {e}")))
}

/// Prints `value` as pretty JSON on stdout
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Script label derived from a file name, restricted to `[A-Za-z0-9_-]`
pub fn script_label(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let label: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if label.is_empty() {
        "script".to_string()
    } else {
        label
    }
}

//! Monitoring settings
//!
//! Stored in the `[monitoring]` table of `hostwatch.toml`. Every field has a
//! serde default so a partial table is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for probes, commands and the polling loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Polling interval in minutes (1–1440, default: 5)
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,
    /// Number of top processes sampled per tick (1–50, default: 5)
    #[serde(default = "default_process_limit")]
    pub process_limit: usize,
    /// Number of journal lines scanned per tick (1–1000, default: 20)
    #[serde(default = "default_error_log_lines")]
    pub error_log_lines: u32,
    /// Default command timeout in seconds (default: 30)
    #[serde(default = "default_exec_timeout_secs")]
    pub exec_timeout_secs: u64,
    /// Connect window in seconds (default: 10)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

const fn default_interval_minutes() -> u32 {
    5
}

const fn default_process_limit() -> usize {
    5
}

const fn default_error_log_lines() -> u32 {
    20
}

const fn default_exec_timeout_secs() -> u64 {
    30
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            process_limit: default_process_limit(),
            error_log_lines: default_error_log_lines(),
            exec_timeout_secs: default_exec_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl MonitorSettings {
    /// Returns the interval clamped to the valid range (1–1440 minutes)
    #[must_use]
    pub const fn effective_interval_minutes(&self) -> u32 {
        clamp_minutes(self.interval_minutes)
    }

    /// Returns the process limit clamped to 1–50
    #[must_use]
    pub fn effective_process_limit(&self) -> usize {
        self.process_limit.clamp(1, 50)
    }

    /// Returns the journal line count clamped to 1–1000
    #[must_use]
    pub fn effective_error_log_lines(&self) -> u32 {
        self.error_log_lines.clamp(1, 1000)
    }

    /// Default command timeout
    #[must_use]
    pub const fn exec_timeout(&self) -> Duration {
        Duration::from_secs(if self.exec_timeout_secs == 0 {
            1
        } else {
            self.exec_timeout_secs
        })
    }

    /// Connect window
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(if self.connect_timeout_secs == 0 {
            1
        } else {
            self.connect_timeout_secs
        })
    }
}

/// Clamps a polling interval to 1–1440 minutes
#[must_use]
pub const fn clamp_minutes(minutes: u32) -> u32 {
    if minutes == 0 {
        1
    } else if minutes > 1440 {
        1440
    } else {
        minutes
    }
}

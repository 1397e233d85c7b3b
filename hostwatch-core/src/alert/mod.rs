//! Threshold alert policy
//!
//! Status checks come first (CPU, memory, disk), then one alert for all down
//! services. Thresholds are fixed. `healthy` on the status is derived
//! separately and is not consulted here.

use serde::Serialize;

use crate::probe::{ServerStatus, ServiceState};

/// CPU warning threshold (percent, exclusive)
pub const CPU_WARNING_PERCENT: f64 = 80.0;
/// Memory warning threshold (percent, exclusive)
pub const MEMORY_WARNING_PERCENT: f64 = 80.0;
/// Disk error threshold (percent, exclusive)
pub const DISK_ERROR_PERCENT: f64 = 90.0;

/// Severity of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// Degraded but working
    Warning,
    /// Needs attention
    Error,
}

impl AlertLevel {
    /// Icon used in rendered notifications
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Warning => "⚠️",
            Self::Error => "❌",
        }
    }
}

/// One human-readable problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    /// Severity
    pub level: AlertLevel,
    /// Message shown to the operator
    pub message: String,
}

impl Alert {
    /// Warning-level alert
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Warning,
            message: message.into(),
        }
    }

    /// Error-level alert
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Error,
            message: message.into(),
        }
    }
}

/// Turns a status snapshot and service states into alerts
#[must_use]
pub fn evaluate(status: &ServerStatus, services: &[ServiceState]) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if status.cpu_percent > CPU_WARNING_PERCENT {
        alerts.push(Alert::warning(format!("CPU alta: {:.1}%", status.cpu_percent)));
    }
    if status.mem_percent > MEMORY_WARNING_PERCENT {
        alerts.push(Alert::warning(format!("Memoria alta: {:.1}%", status.mem_percent)));
    }
    if status.disk_percent > DISK_ERROR_PERCENT {
        alerts.push(Alert::error(format!("Disco casi lleno: {:.1}%", status.disk_percent)));
    }

    let down: Vec<&str> = services
        .iter()
        .filter(|s| !s.active)
        .map(|s| s.service.as_str())
        .collect();
    if !down.is_empty() {
        alerts.push(Alert::error(format!(
            "{} servicio(s) caído(s): {}",
            down.len(),
            down.join(", ")
        )));
    }

    alerts
}

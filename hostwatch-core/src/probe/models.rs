//! Probe result types

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Threshold above which a metric makes the host unhealthy (percent)
pub const HEALTHY_LIMIT_PERCENT: f64 = 90.0;

/// Point-in-time health snapshot of a target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerStatus {
    /// Target name
    pub target_name: String,
    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,
    /// CPU busy percentage
    pub cpu_percent: f64,
    /// Memory used percentage
    pub mem_percent: f64,
    /// Root filesystem used percentage
    pub disk_percent: f64,
    /// Human-readable uptime
    pub uptime: String,
    /// All three percentages at or below [`HEALTHY_LIMIT_PERCENT`]
    pub healthy: bool,
}

impl ServerStatus {
    /// Builds a snapshot stamped now, deriving `healthy`
    #[must_use]
    pub fn new(
        target_name: impl Into<String>,
        cpu_percent: f64,
        mem_percent: f64,
        disk_percent: f64,
        uptime: impl Into<String>,
    ) -> Self {
        Self {
            target_name: target_name.into(),
            timestamp: Utc::now(),
            cpu_percent,
            mem_percent,
            disk_percent,
            uptime: uptime.into(),
            healthy: is_healthy(cpu_percent, mem_percent, disk_percent),
        }
    }
}

/// Health rule shared by every snapshot
#[must_use]
pub fn is_healthy(cpu_percent: f64, mem_percent: f64, disk_percent: f64) -> bool {
    cpu_percent <= HEALTHY_LIMIT_PERCENT
        && mem_percent <= HEALTHY_LIMIT_PERCENT
        && disk_percent <= HEALTHY_LIMIT_PERCENT
}

/// One row of the top-by-CPU process listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessSample {
    /// Owning user
    pub user: String,
    /// Process ID
    pub pid: u32,
    /// CPU usage percentage
    pub cpu_percent: f64,
    /// Memory usage percentage
    pub mem_percent: f64,
    /// Full command line
    pub command: String,
}

/// State of one watched systemd unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceState {
    /// Unit name as configured
    pub service: String,
    /// True iff the raw status is exactly `active`
    pub active: bool,
    /// Raw `systemctl is-active` output, when the query ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Why the query could not run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceState {
    /// State derived from a completed query
    #[must_use]
    pub fn from_status(service: impl Into<String>, raw: &str) -> Self {
        let status = raw.trim().to_string();
        Self {
            service: service.into(),
            active: status == "active",
            status: Some(status),
            error: None,
        }
    }

    /// State for a query that failed
    #[must_use]
    pub fn failed(service: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            active: false,
            status: None,
            error: Some(error.into()),
        }
    }
}

/// Recent high-severity journal lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorLogSummary {
    /// Number of matching lines
    pub count: usize,
    /// First few lines, for display
    pub samples: Vec<String>,
    /// Why the journal could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorLogSummary {
    /// Summary for a failed query
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            count: 0,
            samples: Vec::new(),
            error: Some(error.into()),
        }
    }
}

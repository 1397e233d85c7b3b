//! Monitoring ticks and the per-target polling loops
//!
//! [`Monitor`] runs one tick for one target: probes fan out concurrently,
//! alerts are evaluated and, when there are any, the notifier is called once.
//! [`MonitorScheduler`] keeps one polling loop per monitored target.

mod scheduler;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::alert::{self, Alert};
use crate::exec::CommandExecutor;
use crate::notify::{self, Notifier};
use crate::probe::{
    ErrorLogScanner, ErrorLogSummary, HealthProbe, ProcessSample, ServerStatus, ServiceChecker,
    ServiceState,
};

pub use scheduler::{MonitorScheduler, MonitoringInfo, Stats, TargetSummary};

/// Processes sampled per tick
pub const TICK_PROCESS_LIMIT: usize = 5;
/// Journal lines scanned per tick
pub const TICK_ERROR_LINES: u32 = 20;

/// Everything learned about a target in one tick
#[derive(Debug, Clone, Serialize)]
pub struct MonitorReport {
    /// Target name
    pub target_name: String,
    /// When the tick started
    pub timestamp: DateTime<Utc>,
    /// Status snapshot, absent when the host could not be probed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServerStatus>,
    /// Top processes by CPU
    pub processes: Vec<ProcessSample>,
    /// Watched service states
    pub services: Vec<ServiceState>,
    /// Recent journal errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ErrorLogSummary>,
    /// Alerts derived from this report
    pub alerts: Vec<Alert>,
}

impl MonitorReport {
    /// Report for a tick whose status probe failed
    #[must_use]
    pub fn degraded(target_name: impl Into<String>, timestamp: DateTime<Utc>, reason: &str) -> Self {
        Self {
            target_name: target_name.into(),
            timestamp,
            status: None,
            processes: Vec::new(),
            services: Vec::new(),
            errors: None,
            alerts: vec![Alert::error(format!("Error al monitorear: {reason}"))],
        }
    }

    /// Returns true if the status probe failed
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.status.is_none()
    }
}

/// Runs monitoring ticks
pub struct Monitor {
    health: HealthProbe,
    services: ServiceChecker,
    logs: ErrorLogScanner,
    notifier: Arc<dyn Notifier>,
    process_limit: usize,
    error_lines: u32,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("notifier", &self.notifier.notifier_id())
            .field("process_limit", &self.process_limit)
            .field("error_lines", &self.error_lines)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Creates a monitor sending alerts to `notifier`
    #[must_use]
    pub fn new(executor: Arc<CommandExecutor>, notifier: Arc<dyn Notifier>) -> Self {
        let registry = Arc::clone(executor.sessions().registry());
        Self {
            health: HealthProbe::new(Arc::clone(&executor)),
            services: ServiceChecker::new(registry, Arc::clone(&executor)),
            logs: ErrorLogScanner::new(executor),
            notifier,
            process_limit: TICK_PROCESS_LIMIT,
            error_lines: TICK_ERROR_LINES,
        }
    }

    /// Overrides the per-tick process and journal line counts
    #[must_use]
    pub const fn with_limits(mut self, process_limit: usize, error_lines: u32) -> Self {
        self.process_limit = process_limit;
        self.error_lines = error_lines;
        self
    }

    /// Health probe used by ticks
    #[must_use]
    pub const fn health(&self) -> &HealthProbe {
        &self.health
    }

    /// Service checker used by ticks
    #[must_use]
    pub const fn services(&self) -> &ServiceChecker {
        &self.services
    }

    /// Journal scanner used by ticks
    #[must_use]
    pub const fn logs(&self) -> &ErrorLogScanner {
        &self.logs
    }

    /// Collects a report without notifying
    ///
    /// Never fails: a status failure yields a degraded report, and process
    /// or service failures only empty their own section.
    pub async fn build_report(&self, target: &str) -> MonitorReport {
        let timestamp = Utc::now();
        let (status, processes, services, errors) = tokio::join!(
            self.health.get_status(target),
            self.health.get_processes(target, self.process_limit),
            self.services.check_services(target),
            self.logs.get_recent_errors(target, self.error_lines),
        );

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(target_name = %target, error = %e, "Status probe failed");
                return MonitorReport::degraded(target, timestamp, &e.to_string());
            }
        };

        let processes = processes.unwrap_or_else(|e| {
            tracing::warn!(target_name = %target, error = %e, "Process probe failed");
            Vec::new()
        });
        let services = services.unwrap_or_else(|e| {
            tracing::warn!(target_name = %target, error = %e, "Service probe failed");
            Vec::new()
        });

        let alerts = alert::evaluate(&status, &services);
        MonitorReport {
            target_name: target.to_string(),
            timestamp,
            status: Some(status),
            processes,
            services,
            errors: Some(errors),
            alerts,
        }
    }

    /// Runs one tick: builds the report and notifies once if it has alerts
    ///
    /// A notifier failure is logged and does not affect the report.
    #[tracing::instrument(skip(self), fields(target_name = %target))]
    pub async fn monitor_server(&self, target: &str) -> MonitorReport {
        let report = self.build_report(target).await;
        if report.alerts.is_empty() {
            tracing::debug!("No alerts");
            return report;
        }

        let title = notify::render_title(&report.target_name);
        let summary = notify::render_summary(report.alerts.len());
        let details = notify::render_details(&report.alerts, report.status.as_ref());
        match self.notifier.send_alert(&title, &summary, &details).await {
            Ok(()) => tracing::info!(
                alerts = report.alerts.len(),
                notifier = self.notifier.notifier_id(),
                "Alert sent"
            ),
            Err(e) => tracing::error!(
                notifier = self.notifier.notifier_id(),
                error = %e,
                "Failed to deliver alert"
            ),
        }
        report
    }
}

//! Per-target polling loops
//!
//! Each monitored target owns a spawned loop driven by a `tokio::time`
//! interval. The first tick fires immediately. Stopping drops the handle's
//! stop sender: future ticks are cancelled, a tick already running finishes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::{MonitorSettings, TargetRegistry, clamp_minutes};
use crate::error::{MonitorError, MonitorResult};
use crate::session::SessionManager;

use super::Monitor;

/// Default polling interval in minutes
pub const DEFAULT_INTERVAL_MINUTES: u32 = 5;

/// Live polling loop for one target
struct MonitoringHandle {
    info: MonitoringInfo,
    // Dropping the sender stops the loop
    _stop_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

/// Public view of a monitoring loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitoringInfo {
    /// Target name
    pub target_name: String,
    /// Polling interval in minutes
    pub interval_minutes: u32,
    /// When monitoring started
    pub started_at: DateTime<Utc>,
}

/// One row of [`MonitorScheduler::list_targets`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSummary {
    /// Target name
    pub name: String,
    /// Hostname or IP address
    pub host: String,
    /// SSH port
    pub port: u16,
    /// Remote login user
    pub username: String,
    /// Watched services
    pub services: Vec<String>,
    /// Has a ready session
    pub connected: bool,
    /// Has an active polling loop
    pub monitoring: bool,
}

/// Aggregate counters from [`MonitorScheduler::get_stats`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Configured targets
    pub total_targets: usize,
    /// Targets with a ready session
    pub active_connections: usize,
    /// Targets with an active polling loop
    pub active_monitoring: usize,
    /// Per-target rows
    pub targets: Vec<TargetSummary>,
}

/// Owns one polling loop per monitored target
pub struct MonitorScheduler {
    monitor: Arc<Monitor>,
    sessions: Arc<SessionManager>,
    default_interval_minutes: u32,
    handles: Mutex<HashMap<String, MonitoringHandle>>,
}

impl std::fmt::Debug for MonitorScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorScheduler")
            .field("default_interval_minutes", &self.default_interval_minutes)
            .field("monitored", &self.handles().len())
            .finish_non_exhaustive()
    }
}

impl MonitorScheduler {
    /// Creates a scheduler with no active loops
    #[must_use]
    pub fn new(monitor: Arc<Monitor>, sessions: Arc<SessionManager>) -> Self {
        Self {
            monitor,
            sessions,
            default_interval_minutes: DEFAULT_INTERVAL_MINUTES,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Uses the interval from settings when none is given
    #[must_use]
    pub fn with_settings(mut self, settings: &MonitorSettings) -> Self {
        self.default_interval_minutes = settings.effective_interval_minutes();
        self
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<String, MonitoringHandle>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn registry(&self) -> &TargetRegistry {
        self.sessions.registry()
    }

    /// Monitor used by the loops
    #[must_use]
    pub fn monitor(&self) -> &Arc<Monitor> {
        &self.monitor
    }

    /// Starts polling `target` every `interval_minutes` (clamped to 1–1440)
    ///
    /// The first tick runs right away. Starting a target that is already
    /// monitored logs a warning and keeps the existing loop. The loop is
    /// spawned on the runtime of the calling context.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::UnknownTarget` if the target is not registered,
    /// or `MonitorError::NoRuntime` when called outside a Tokio runtime.
    pub fn start_monitoring(&self, target: &str, interval_minutes: Option<u32>) -> MonitorResult<()> {
        let minutes = clamp_minutes(interval_minutes.unwrap_or(self.default_interval_minutes));
        self.start_with_period(
            target,
            minutes,
            Duration::from_secs(u64::from(minutes) * 60),
        )
    }

    fn start_with_period(&self, target: &str, minutes: u32, period: Duration) -> MonitorResult<()> {
        if !self.registry().contains(target) {
            return Err(MonitorError::UnknownTarget(target.to_string()));
        }

        let mut handles = self.handles();
        if let Some(existing) = handles.get(target) {
            tracing::warn!(
                target_name = %target,
                interval_minutes = existing.info.interval_minutes,
                "Monitoring already active"
            );
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| MonitorError::NoRuntime(e.to_string()))?;
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let task = runtime.spawn(run_loop(
            Arc::clone(&self.monitor),
            target.to_string(),
            period,
            stop_rx,
        ));
        handles.insert(
            target.to_string(),
            MonitoringHandle {
                info: MonitoringInfo {
                    target_name: target.to_string(),
                    interval_minutes: minutes,
                    started_at: Utc::now(),
                },
                _stop_tx: stop_tx,
                task,
            },
        );
        tracing::info!(target_name = %target, interval_minutes = minutes, "Monitoring started");
        Ok(())
    }

    /// Stops polling `target`
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::NotMonitored` if no loop exists.
    pub fn stop_monitoring(&self, target: &str) -> MonitorResult<()> {
        let handle = self
            .handles()
            .remove(target)
            .ok_or_else(|| MonitorError::NotMonitored(target.to_string()))?;
        drop(handle);
        tracing::info!(target_name = %target, "Monitoring stopped");
        Ok(())
    }

    /// Stops every loop and returns how many were running
    pub fn stop_all_monitoring(&self) -> usize {
        let drained: Vec<String> = self.handles().drain().map(|(name, _)| name).collect();
        for name in &drained {
            tracing::info!(target_name = %name, "Monitoring stopped");
        }
        drained.len()
    }

    /// Returns true if `target` has a polling loop
    #[must_use]
    pub fn is_monitoring(&self, target: &str) -> bool {
        self.handles().contains_key(target)
    }

    /// Snapshot of the active loops, sorted by target name
    #[must_use]
    pub fn monitoring(&self) -> Vec<MonitoringInfo> {
        let mut infos: Vec<MonitoringInfo> =
            self.handles().values().map(|h| h.info.clone()).collect();
        infos.sort_by(|a, b| a.target_name.cmp(&b.target_name));
        infos
    }

    /// One row per configured target, in configuration order
    #[must_use]
    pub fn list_targets(&self) -> Vec<TargetSummary> {
        let handles = self.handles();
        self.registry()
            .iter()
            .map(|t| TargetSummary {
                name: t.name.clone(),
                host: t.host.clone(),
                port: t.port,
                username: t.username.clone(),
                services: t.watched_services.clone(),
                connected: self.sessions.is_connected(&t.name),
                monitoring: handles.contains_key(&t.name),
            })
            .collect()
    }

    /// Aggregate counters plus [`list_targets`](Self::list_targets)
    #[must_use]
    pub fn get_stats(&self) -> Stats {
        let targets = self.list_targets();
        Stats {
            total_targets: targets.len(),
            active_connections: targets.iter().filter(|t| t.connected).count(),
            active_monitoring: targets.iter().filter(|t| t.monitoring).count(),
            targets,
        }
    }
}

impl Drop for MonitorScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.handles().drain() {
            handle.task.abort();
        }
    }
}

async fn run_loop(
    monitor: Arc<Monitor>,
    target: String,
    period: Duration,
    mut stop_rx: mpsc::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    // A slow tick pushes the next one back instead of bursting
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.recv() => break,
            _ = ticker.tick() => {
                let report = monitor.monitor_server(&target).await;
                tracing::debug!(
                    target_name = %target,
                    alerts = report.alerts.len(),
                    degraded = report.is_degraded(),
                    "Tick finished"
                );
            }
        }
    }
    tracing::debug!(target_name = %target, "Monitoring loop exited");
}

//! Process-wide entry point
//!
//! [`Hostwatch`] wires the registry, session manager, executor, probes and
//! scheduler together once at startup and exposes the caller-facing
//! operations. Every component keeps its own state; nothing is global.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ConfigProvider, MonitorSettings, TargetRegistry};
use crate::error::{ExecResult, HostwatchResult, MonitorResult, ProbeResult, SessionResult};
use crate::exec::{CommandExecutor, CommandResult};
use crate::monitor::{Monitor, MonitorReport, MonitorScheduler, MonitoringInfo, Stats, TargetSummary};
use crate::notify::Notifier;
use crate::probe::{
    DEFAULT_ERROR_LINES, DEFAULT_PROCESS_LIMIT, ErrorLogSummary, ProcessSample, ServerStatus,
    ServiceState,
};
use crate::session::{Session, SessionManager, SessionState};
use crate::transport::{Connector, OpenSshConnector};

/// Remote session and health-monitoring core
#[derive(Debug)]
pub struct Hostwatch {
    settings: MonitorSettings,
    sessions: Arc<SessionManager>,
    executor: Arc<CommandExecutor>,
    scheduler: MonitorScheduler,
}

impl Hostwatch {
    /// Wires every component around the given connector and notifier
    #[must_use]
    pub fn new(
        registry: TargetRegistry,
        settings: MonitorSettings,
        connector: Arc<dyn Connector>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let sessions = Arc::new(SessionManager::new(
            Arc::new(registry),
            connector,
            settings.connect_timeout(),
        ));
        let executor = Arc::new(CommandExecutor::with_default_timeout(
            Arc::clone(&sessions),
            settings.exec_timeout(),
        ));
        let monitor = Arc::new(
            Monitor::new(Arc::clone(&executor), notifier)
                .with_limits(settings.effective_process_limit(), settings.effective_error_log_lines()),
        );
        let scheduler =
            MonitorScheduler::new(monitor, Arc::clone(&sessions)).with_settings(&settings);

        Self {
            settings,
            sessions,
            executor,
            scheduler,
        }
    }

    /// Uses the system OpenSSH client as transport
    #[must_use]
    pub fn with_openssh(
        registry: TargetRegistry,
        settings: MonitorSettings,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let connector =
            OpenSshConnector::new().with_connect_timeout_secs(settings.connect_timeout().as_secs());
        Self::new(registry, settings, Arc::new(connector), notifier)
    }

    /// Loads targets and settings from `provider`, using OpenSSH
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the provider fails or the targets
    /// are invalid.
    pub fn from_provider(
        provider: &dyn ConfigProvider,
        notifier: Arc<dyn Notifier>,
    ) -> HostwatchResult<Self> {
        let settings = provider.load_settings()?;
        let registry = TargetRegistry::from_provider(provider)?;
        Ok(Self::with_openssh(registry, settings, notifier))
    }

    /// Loaded targets
    #[must_use]
    pub fn registry(&self) -> &TargetRegistry {
        self.sessions.registry()
    }

    /// Loaded settings
    #[must_use]
    pub const fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Session manager
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Command executor
    #[must_use]
    pub fn executor(&self) -> &Arc<CommandExecutor> {
        &self.executor
    }

    /// Monitoring scheduler
    #[must_use]
    pub const fn scheduler(&self) -> &MonitorScheduler {
        &self.scheduler
    }

    /// Connects (or reuses the session) for `target`
    ///
    /// # Errors
    ///
    /// See [`SessionManager::connect`].
    pub async fn connect(&self, target: &str) -> SessionResult<Arc<Session>> {
        self.sessions.connect(target).await
    }

    /// Closes the session for `target`; monitoring keeps running
    ///
    /// # Errors
    ///
    /// See [`SessionManager::disconnect`].
    pub async fn disconnect(&self, target: &str) -> SessionResult<()> {
        self.sessions.disconnect(target).await
    }

    /// Closes every session
    pub async fn disconnect_all(&self) {
        self.sessions.disconnect_all().await;
    }

    /// Session state of `target`
    #[must_use]
    pub fn session_state(&self, target: &str) -> Option<SessionState> {
        self.sessions.state(target)
    }

    /// Runs a command; `None` uses the configured default timeout
    ///
    /// # Errors
    ///
    /// See [`CommandExecutor::exec`].
    pub async fn exec(
        &self,
        target: &str,
        command: &str,
        timeout: Option<Duration>,
    ) -> ExecResult<CommandResult> {
        self.executor.exec(target, command, timeout).await
    }

    /// Uploads and runs a script
    ///
    /// # Errors
    ///
    /// See [`CommandExecutor::exec_script`].
    pub async fn exec_script(
        &self,
        target: &str,
        content: &str,
        label: Option<&str>,
    ) -> ExecResult<CommandResult> {
        self.executor.exec_script(target, content, label).await
    }

    /// Health snapshot of `target`
    ///
    /// # Errors
    ///
    /// Returns a probe error if the metric commands could not run.
    pub async fn get_status(&self, target: &str) -> ProbeResult<ServerStatus> {
        self.scheduler.monitor().health().get_status(target).await
    }

    /// Top processes by CPU; `None` returns the default count
    ///
    /// # Errors
    ///
    /// Returns a probe error if the listing could not run.
    pub async fn get_processes(
        &self,
        target: &str,
        limit: Option<usize>,
    ) -> ProbeResult<Vec<ProcessSample>> {
        self.scheduler
            .monitor()
            .health()
            .get_processes(target, limit.unwrap_or(DEFAULT_PROCESS_LIMIT))
            .await
    }

    /// Watched service states
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::UnknownTarget` for an unregistered target.
    pub async fn check_services(&self, target: &str) -> ProbeResult<Vec<ServiceState>> {
        self.scheduler.monitor().services().check_services(target).await
    }

    /// Recent journal errors; `None` scans the default line count
    pub async fn get_recent_errors(&self, target: &str, lines: Option<u32>) -> ErrorLogSummary {
        self.scheduler
            .monitor()
            .logs()
            .get_recent_errors(target, lines.unwrap_or(DEFAULT_ERROR_LINES))
            .await
    }

    /// One monitoring tick outside any loop
    pub async fn monitor_server(&self, target: &str) -> MonitorReport {
        self.scheduler.monitor().monitor_server(target).await
    }

    /// Starts a polling loop
    ///
    /// # Errors
    ///
    /// See [`MonitorScheduler::start_monitoring`].
    pub fn start_monitoring(&self, target: &str, interval_minutes: Option<u32>) -> MonitorResult<()> {
        self.scheduler.start_monitoring(target, interval_minutes)
    }

    /// Stops a polling loop
    ///
    /// # Errors
    ///
    /// See [`MonitorScheduler::stop_monitoring`].
    pub fn stop_monitoring(&self, target: &str) -> MonitorResult<()> {
        self.scheduler.stop_monitoring(target)
    }

    /// Stops every polling loop
    pub fn stop_all_monitoring(&self) -> usize {
        self.scheduler.stop_all_monitoring()
    }

    /// Active polling loops
    #[must_use]
    pub fn monitoring(&self) -> Vec<MonitoringInfo> {
        self.scheduler.monitoring()
    }

    /// One row per configured target
    #[must_use]
    pub fn list_targets(&self) -> Vec<TargetSummary> {
        self.scheduler.list_targets()
    }

    /// Aggregate counters
    #[must_use]
    pub fn get_stats(&self) -> Stats {
        self.scheduler.get_stats()
    }

    /// Stops all monitoring, then closes all sessions
    pub async fn shutdown(&self) {
        let stopped = self.stop_all_monitoring();
        self.disconnect_all().await;
        tracing::info!(stopped_loops = stopped, "Hostwatch shut down");
    }
}

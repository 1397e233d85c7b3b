//! In-process test doubles
//!
//! [`MockConnector`] hands out [`ScriptedTransport`]s whose command replies come
//! from a shared handler, so sessions, executors, probes and the scheduler can
//! be exercised without a real SSH server. [`FakeHost`] builds a handler that
//! answers the probe commands like a small Linux box would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::config::TargetConfig;
use crate::error::{NotifyError, NotifyResult, TransportError, TransportResult};
use crate::notify::Notifier;
use crate::transport::{ChannelOutput, Connector, Transport};

/// What a scripted transport does with one command
#[derive(Debug, Clone)]
pub enum Reply {
    /// Channel closes with this output
    Output(ChannelOutput),
    /// Channel closes with this output after a delay
    Delayed(Duration, ChannelOutput),
    /// Channel never closes
    Hang,
    /// Channel fails to open
    Fail(String),
}

impl Reply {
    /// Exit 0 with the given stdout
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self::Output(ChannelOutput::exited(0, stdout, ""))
    }

    /// Exits with `code` and the given streams
    #[must_use]
    pub fn exit(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::Output(ChannelOutput::exited(code, stdout, stderr))
    }

    /// Terminated by a signal, no exit code
    #[must_use]
    pub fn signal(name: impl Into<String>) -> Self {
        Self::Output(ChannelOutput {
            exit_code: None,
            signal: Some(name.into()),
            ..ChannelOutput::default()
        })
    }
}

/// Maps a command line to a reply
pub type Handler = Arc<dyn Fn(&str) -> Reply + Send + Sync>;

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Decrements the open channel count when the exec future finishes or is dropped
struct ChannelGuard<'a>(&'a AtomicUsize);

impl Drop for ChannelGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Transport answering commands from a handler
pub struct ScriptedTransport {
    handler: Handler,
    commands: Mutex<Vec<String>>,
    open_channels: AtomicUsize,
    close_calls: AtomicUsize,
    closed: watch::Sender<bool>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new(Arc::new(|_: &str| Reply::ok("")))
    }
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("commands", &lock(&self.commands).len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl ScriptedTransport {
    /// Creates a transport answering with `handler`
    #[must_use]
    pub fn new(handler: Handler) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            handler,
            commands: Mutex::new(Vec::new()),
            open_channels: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
            closed,
        }
    }

    /// Every command issued so far, in order
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        lock(&self.commands).clone()
    }

    /// Channels currently open
    #[must_use]
    pub fn open_channels(&self) -> usize {
        self.open_channels.load(Ordering::SeqCst)
    }

    /// Number of `close` calls
    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Simulates the remote host ending the connection
    pub fn drop_remote(&self) {
        self.closed.send_replace(true);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn exec(&self, command: &str) -> TransportResult<ChannelOutput> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        lock(&self.commands).push(command.to_string());

        let (delay, output) = match (self.handler)(command) {
            Reply::Fail(reason) => return Err(TransportError::Channel(reason)),
            Reply::Output(output) => (None, Some(output)),
            Reply::Delayed(delay, output) => (Some(delay), Some(output)),
            Reply::Hang => (None, None),
        };

        self.open_channels.fetch_add(1, Ordering::SeqCst);
        let _guard = ChannelGuard(&self.open_channels);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match output {
            Some(output) => Ok(output),
            None => std::future::pending().await,
        }
    }

    async fn close(&self) -> TransportResult<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.send_replace(true);
        Ok(())
    }

    async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

/// How the mock connector treats a connect attempt
#[derive(Debug, Clone, Default)]
pub enum ConnectBehavior {
    /// Succeeds immediately
    #[default]
    Accept,
    /// Succeeds after a delay
    Delay(Duration),
    /// Fails with an authentication error
    RejectAuth,
    /// Fails with a network error
    Unreachable,
    /// Never completes
    Hang,
}

/// Connector producing [`ScriptedTransport`]s
pub struct MockConnector {
    handler: Handler,
    behaviors: Mutex<HashMap<String, ConnectBehavior>>,
    connects: AtomicUsize,
    transports: Mutex<Vec<(String, Arc<ScriptedTransport>)>>,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockConnector")
            .field("connects", &self.connect_count())
            .finish_non_exhaustive()
    }
}

impl MockConnector {
    /// Connector whose transports answer every command with exit 0
    #[must_use]
    pub fn new() -> Self {
        Self::with_handler(Arc::new(|_: &str| Reply::ok("")))
    }

    /// Connector whose transports answer with `handler`
    #[must_use]
    pub fn with_handler(handler: Handler) -> Self {
        Self {
            handler,
            behaviors: Mutex::new(HashMap::new()),
            connects: AtomicUsize::new(0),
            transports: Mutex::new(Vec::new()),
        }
    }

    /// Sets the connect behavior for one target
    pub fn set_behavior(&self, target: &str, behavior: ConnectBehavior) {
        lock(&self.behaviors).insert(target.to_string(), behavior);
    }

    /// Number of connect attempts that reached the connector
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Most recent transport handed out for `target`
    #[must_use]
    pub fn last_transport(&self, target: &str) -> Option<Arc<ScriptedTransport>> {
        lock(&self.transports)
            .iter()
            .rev()
            .find(|(name, _)| name == target)
            .map(|(_, t)| Arc::clone(t))
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, target: &TargetConfig) -> TransportResult<Arc<dyn Transport>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let behavior = lock(&self.behaviors)
            .get(&target.name)
            .cloned()
            .unwrap_or_default();

        match behavior {
            ConnectBehavior::Accept => {}
            ConnectBehavior::Delay(delay) => tokio::time::sleep(delay).await,
            ConnectBehavior::RejectAuth => {
                return Err(TransportError::Auth(format!(
                    "{}: Permission denied",
                    target.destination()
                )));
            }
            ConnectBehavior::Unreachable => {
                return Err(TransportError::Network(format!(
                    "connect to host {} port {}: Connection refused",
                    target.host, target.port
                )));
            }
            ConnectBehavior::Hang => std::future::pending::<()>().await,
        }

        let transport = Arc::new(ScriptedTransport::new(Arc::clone(&self.handler)));
        lock(&self.transports).push((target.name.clone(), Arc::clone(&transport)));
        Ok(transport)
    }

    fn connector_id(&self) -> &'static str {
        "mock"
    }
}

/// Canned answers to the probe commands
#[derive(Debug, Clone)]
pub struct FakeHost {
    /// CPU idle percentage reported by `top`
    pub cpu_idle: f64,
    /// Total and used memory reported by `free`
    pub memory: (u64, u64),
    /// Root filesystem use percentage reported by `df`
    pub disk_percent: u32,
    /// Output of `uptime -p`
    pub uptime: String,
    /// Services reported active by `systemctl is-active`
    pub active_services: Vec<String>,
    /// Lines returned by `journalctl`
    pub journal: Vec<String>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            cpu_idle: 95.0,
            memory: (8_000_000, 2_000_000),
            disk_percent: 40,
            uptime: "up 3 days, 4 hours".to_string(),
            active_services: Vec::new(),
            journal: Vec::new(),
        }
    }
}

impl FakeHost {
    /// Sets CPU usage (idle becomes `100 - usage`)
    #[must_use]
    pub fn with_cpu_usage(mut self, usage: f64) -> Self {
        self.cpu_idle = 100.0 - usage;
        self
    }

    /// Sets memory usage as a percentage of 8 GB
    #[must_use]
    pub fn with_memory_usage(mut self, percent: u64) -> Self {
        self.memory = (8_000_000, 80_000 * percent);
        self
    }

    /// Sets disk usage
    #[must_use]
    pub const fn with_disk_usage(mut self, percent: u32) -> Self {
        self.disk_percent = percent;
        self
    }

    /// Marks services as active
    #[must_use]
    pub fn with_active_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_services = services.into_iter().map(Into::into).collect();
        self
    }

    /// Sets journal lines
    #[must_use]
    pub fn with_journal<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.journal = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Answers one command
    #[must_use]
    pub fn reply(&self, command: &str) -> Reply {
        if command.starts_with("top ") {
            Reply::ok(format!(
                "%Cpu(s):  3.1 us,  1.2 sy,  0.0 ni, {:.1} id,  0.0 wa,  0.0 hi,  0.0 si,  0.0 st",
                self.cpu_idle
            ))
        } else if command.starts_with("free") {
            let (total, used) = self.memory;
            let free = total.saturating_sub(used);
            Reply::ok(format!(
                "Mem:        {total}     {used}     {free}       1024      50000     {free}"
            ))
        } else if command.starts_with("df ") {
            Reply::ok(format!(
                "/dev/sda1       41152736 16461094  22568000  {}% /",
                self.disk_percent
            ))
        } else if command.starts_with("uptime") {
            Reply::ok(self.uptime.clone())
        } else if command.starts_with("ps aux") {
            Reply::ok(
                "USER         PID %CPU %MEM    VSZ   RSS TTY      STAT START   TIME COMMAND\n\
                 root        1201 12.5  3.2 812344 262144 ?      Ssl  Jan01  42:10 /usr/bin/dockerd -H fd://\n\
                 www-data    2210  4.0  1.1 221000 90112 ?       S    Jan01   3:02 nginx: worker process\n\
                 postgres    3301  1.5  6.0 410000 491520 ?      Ss   Jan01  10:45 postgres: checkpointer",
            )
        } else if let Some(service) = command.strip_prefix("systemctl is-active ") {
            if self.active_services.iter().any(|s| s == service) {
                Reply::ok("active\n")
            } else {
                Reply::exit(3, "inactive\n", "")
            }
        } else if command.starts_with("journalctl") {
            Reply::ok(self.journal.join("\n"))
        } else {
            Reply::ok("")
        }
    }

    /// Converts into a transport handler
    #[must_use]
    pub fn into_handler(self) -> Handler {
        Arc::new(move |command: &str| self.reply(command))
    }
}

/// Alert captured by [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentAlert {
    /// Alert title
    pub title: String,
    /// One-line summary
    pub summary: String,
    /// Rendered HTML details
    pub details_html: String,
}

/// Notifier that keeps every alert in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentAlert>>,
    fail: bool,
}

impl RecordingNotifier {
    /// Notifier whose deliveries always fail (alerts are still recorded)
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Alerts delivered so far
    #[must_use]
    pub fn sent(&self) -> Vec<SentAlert> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_alert(&self, title: &str, summary: &str, details_html: &str) -> NotifyResult<()> {
        lock(&self.sent).push(SentAlert {
            title: title.to_string(),
            summary: summary.to_string(),
            details_html: details_html.to_string(),
        });
        if self.fail {
            return Err(NotifyError::Delivery {
                backend: self.notifier_id(),
                reason: "delivery disabled".to_string(),
            });
        }
        Ok(())
    }

    fn notifier_id(&self) -> &'static str {
        "recording"
    }
}

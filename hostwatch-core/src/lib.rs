//! `Hostwatch` Core Library
//!
//! Keeps authenticated SSH sessions to a fixed set of named hosts, runs
//! commands and scripts on them with enforced timeouts, samples host health
//! and raises threshold alerts from one polling loop per host.
//!
//! # Crate Structure
//!
//! - [`config`] - Targets, providers (environment, TOML) and monitoring settings
//! - [`transport`] - Connector/transport traits and the OpenSSH implementation
//! - [`session`] - Session lifecycle and the per-target session manager
//! - [`exec`] - Remote commands and uploaded scripts
//! - [`probe`] - Health, process, service and journal probes
//! - [`alert`] - Threshold alert policy
//! - [`notify`] - Alert rendering and delivery backends
//! - [`monitor`] - Monitoring ticks and the polling scheduler
//! - [`hub`] - The [`Hostwatch`] facade
//! - [`testing`] - In-memory transport and notifier for tests

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod alert;
pub mod config;
pub mod error;
pub mod exec;
pub mod hub;
pub mod monitor;
pub mod notify;
pub mod probe;
pub mod session;
pub mod testing;
pub mod tracing;
pub mod transport;

pub use alert::{Alert, AlertLevel, evaluate};
pub use config::{
    AuthSecret, ConfigProvider, EnvConfigProvider, FileConfigProvider, MonitorSettings,
    TargetConfig, TargetRegistry,
};
pub use error::{
    ConfigError, ExecError, HostwatchError, HostwatchResult, MonitorError, NotifyError,
    ProbeError, SessionError, TransportError,
};
pub use exec::{CommandExecutor, CommandResult};
pub use hub::Hostwatch;
pub use monitor::{Monitor, MonitorReport, MonitorScheduler, MonitoringInfo, Stats, TargetSummary};
pub use notify::{CommandNotifier, Notifier, TracingNotifier};
pub use probe::{
    ErrorLogScanner, ErrorLogSummary, HealthProbe, ProcessSample, ServerStatus, ServiceChecker,
    ServiceState,
};
pub use session::{Session, SessionManager, SessionState};
pub use transport::{ChannelOutput, Connector, OpenSshConnector, Transport};

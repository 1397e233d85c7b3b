//! Error types for `Hostwatch`
//!
//! Each concern has its own `thiserror` enum and result alias. Errors raised by
//! explicit operations (connect, exec, start/stop monitoring) propagate to the
//! caller; errors raised inside a monitoring tick are folded into the report.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type aggregating every concern of the crate
#[derive(Debug, Error)]
pub enum HostwatchError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session lifecycle error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Command execution error
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Probe error
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Monitoring scheduler error
    #[error(transparent)]
    Monitor(#[from] MonitorError),

    /// Notification delivery error
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for facade operations
pub type HostwatchResult<T> = Result<T, HostwatchError>;

/// Errors raised while loading target configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value is missing
    #[error("Missing configuration value: {0}")]
    Missing(String),

    /// A value is present but invalid
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Field or variable name
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Two targets share the same name
    #[error("Duplicate target name: {0}")]
    DuplicateTarget(String),

    /// The configuration file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// The configuration file could not be parsed
    #[error("Failed to parse {path}: {reason}")]
    Parse {
        /// Path of the configuration file
        path: PathBuf,
        /// Parser message
        reason: String,
    },
}

/// Errors raised by a transport implementation
#[derive(Debug, Error)]
pub enum TransportError {
    /// The remote host rejected the credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The remote host could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// A command channel could not be opened or broke mid-flight
    #[error("Channel error: {0}")]
    Channel(String),

    /// The transport has already been closed
    #[error("Transport closed")]
    Closed,

    /// Local process or socket error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors raised by the session manager
#[derive(Debug, Error)]
pub enum SessionError {
    /// No target is registered under this name
    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    /// Neither a password nor a private key is configured
    #[error("No authentication method configured for {0}")]
    MissingAuth(String),

    /// The transport failed to authenticate or connect
    #[error("Failed to connect to {target}: {source}")]
    Connect {
        /// Target name
        target: String,
        /// Underlying transport error
        source: TransportError,
    },

    /// The transport was not ready within the connect window
    #[error("Timeout connecting to {target} after {secs}s")]
    ConnectTimeout {
        /// Target name
        target: String,
        /// Connect window in seconds
        secs: u64,
    },

    /// No ready session exists for the target
    #[error("No active connection to {0}")]
    NotConnected(String),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised while executing commands or scripts
#[derive(Debug, Error)]
pub enum ExecError {
    /// The session could not be obtained
    #[error(transparent)]
    Session(#[from] SessionError),

    /// No close event arrived within the timeout
    #[error("Timeout executing command")]
    Timeout {
        /// Target name
        target: String,
        /// Timeout that elapsed, in milliseconds
        timeout_ms: u64,
    },

    /// The command channel failed
    #[error("Command channel to {target} failed: {source}")]
    Channel {
        /// Target name
        target: String,
        /// Underlying transport error
        source: TransportError,
    },

    /// The script could not be written to the remote host
    #[error("Failed to upload script to {target}: {reason}")]
    ScriptUpload {
        /// Target name
        target: String,
        /// Remote stderr or exit status
        reason: String,
    },

    /// The script label contains characters that are not allowed in a path
    #[error("Invalid script label: {0}")]
    InvalidLabel(String),
}

impl ExecError {
    /// Returns true if this error is a command timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type for command execution
pub type ExecResult<T> = Result<T, ExecError>;

/// Errors raised by health, service and log probes
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No target is registered under this name
    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    /// A remote probe command failed to execute
    #[error("{probe} probe failed: {source}")]
    Exec {
        /// Probe name (cpu, memory, disk, uptime, processes)
        probe: &'static str,
        /// Underlying execution error
        source: ExecError,
    },
}

/// Result type for probes
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors raised by the monitoring scheduler
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The target has no active monitoring loop
    #[error("No active monitoring for {0}")]
    NotMonitored(String),

    /// No target is registered under this name
    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    /// The loop could not be spawned because no Tokio runtime is running
    #[error("Monitoring requires a Tokio runtime: {0}")]
    NoRuntime(String),
}

/// Result type for scheduler operations
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors raised while delivering an alert
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The notifier backend rejected or failed the delivery
    #[error("Failed to deliver alert via {backend}: {reason}")]
    Delivery {
        /// Notifier identifier
        backend: &'static str,
        /// Failure description
        reason: String,
    },

    /// Local process error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for notifier operations
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

//! CLI error types and exit codes.

use hostwatch_core::error::{
    ConfigError, ExecError, HostwatchError, MonitorError, ProbeError, SessionError,
};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, validation, or other non-connection errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Connection failure - the target could not be reached or a command
    /// could not be run
    pub const CONNECTION_FAILURE: i32 = 2;
    /// The remote command ran but exited non-zero
    pub const REMOTE_FAILURE: i32 = 3;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Target not found
    #[error("Unknown target: {0}")]
    TargetNotFound(String),

    /// Connection or command error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Monitoring error
    #[error("Monitoring error: {0}")]
    Monitor(String),

    /// Remote command exited non-zero
    #[error("Remote command failed: {0}")]
    RemoteFailed(String),

    /// Output serialization error
    #[error("Output error: {0}")]
    Output(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UnknownTarget(name) => Self::TargetNotFound(name),
            SessionError::MissingAuth(_) => Self::Config(err.to_string()),
            other => Self::Connection(other.to_string()),
        }
    }
}

impl From<ExecError> for CliError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::Session(e) => e.into(),
            ExecError::InvalidLabel(_) => Self::Config(err.to_string()),
            other => Self::Connection(other.to_string()),
        }
    }
}

impl From<ProbeError> for CliError {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::UnknownTarget(name) => Self::TargetNotFound(name),
            ProbeError::Exec { source, .. } => source.into(),
        }
    }
}

impl From<MonitorError> for CliError {
    fn from(err: MonitorError) -> Self {
        match err {
            MonitorError::UnknownTarget(name) => Self::TargetNotFound(name),
            other @ (MonitorError::NotMonitored(_) | MonitorError::NoRuntime(_)) => {
                Self::Monitor(other.to_string())
            }
        }
    }
}

impl From<HostwatchError> for CliError {
    fn from(err: HostwatchError) -> Self {
        match err {
            HostwatchError::Config(e) => e.into(),
            HostwatchError::Session(e) => e.into(),
            HostwatchError::Exec(e) => e.into(),
            HostwatchError::Probe(e) => e.into(),
            HostwatchError::Monitor(e) => e.into(),
            HostwatchError::Notify(e) => Self::Connection(e.to_string()),
            HostwatchError::Io(e) => Self::Io(e),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, validation, IO)
    /// - 2: Connection failure (unknown target, connect, exec, timeout)
    /// - 3: Remote command exited non-zero
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::TargetNotFound(_) | Self::Connection(_) => exit_codes::CONNECTION_FAILURE,
            Self::RemoteFailed(_) => exit_codes::REMOTE_FAILURE,
            Self::Config(_) | Self::Monitor(_) | Self::Output(_) | Self::Io(_) => {
                exit_codes::GENERAL_ERROR
            }
        }
    }
}

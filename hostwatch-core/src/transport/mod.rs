//! Remote shell transports
//!
//! A [`Connector`] establishes one authenticated [`Transport`] per target. The
//! session manager owns the transport; the executor opens command channels on
//! it. The production implementation drives the OpenSSH client
//! ([`openssh::OpenSshConnector`]); tests use [`crate::testing`].

pub mod openssh;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::TargetConfig;
use crate::error::TransportResult;

pub use openssh::OpenSshConnector;

/// Raw outcome of one command channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelOutput {
    /// Exit code reported on channel close, if any
    pub exit_code: Option<i32>,
    /// Signal that terminated the command, if any
    pub signal: Option<String>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ChannelOutput {
    /// Output of a command that exited normally
    #[must_use]
    pub fn exited(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            signal: None,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

/// Establishes transports to targets
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens and authenticates a new transport
    ///
    /// The caller bounds this call with its own connect timeout; dropping the
    /// returned future must abandon the attempt and release its resources.
    async fn connect(&self, target: &TargetConfig) -> TransportResult<Arc<dyn Transport>>;

    /// Identifier for logs
    fn connector_id(&self) -> &'static str;
}

/// One live authenticated connection that multiplexes command channels
#[async_trait]
pub trait Transport: Send + Sync {
    /// Runs a command on a new channel and waits for the channel to close
    ///
    /// Dropping the returned future closes the channel.
    async fn exec(&self, command: &str) -> TransportResult<ChannelOutput>;

    /// Ends the transport
    async fn close(&self) -> TransportResult<()>;

    /// Resolves once the transport has ended, whether closed locally or remotely
    async fn closed(&self);

    /// Returns true if the transport has ended
    fn is_closed(&self) -> bool;
}

//! SSH session lifecycle
//!
//! A [`Session`] wraps one live transport to a target. The
//! [`SessionManager`] keeps at most one session per target and reuses it for
//! every command until it is disconnected or the remote side drops it.

mod manager;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::transport::Transport;

pub use manager::SessionManager;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// The remote side ended the transport
    Disconnected,
    /// Authentication in progress
    Connecting,
    /// Usable for commands
    Ready,
    /// Closed locally by an explicit disconnect
    Closed,
}

impl SessionState {
    /// Returns true if commands may be issued
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// One authenticated connection to a target
pub struct Session {
    target_name: String,
    connected_at: DateTime<Utc>,
    state: watch::Sender<SessionState>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("target_name", &self.target_name)
            .field("connected_at", &self.connected_at)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(target_name: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let (state, _) = watch::channel(SessionState::Ready);
        Self {
            target_name: target_name.into(),
            connected_at: Utc::now(),
            state,
            transport,
        }
    }

    /// Name of the target this session belongs to
    #[must_use]
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// When the session became ready
    #[must_use]
    pub const fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Returns true if the session is ready and its transport is alive
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state().is_ready() && !self.transport.is_closed()
    }

    /// Subscribes to state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Moves to `next` unless the session already ended.
    ///
    /// Returns true if the state changed.
    pub(crate) fn mark(&self, next: SessionState) -> bool {
        self.state.send_if_modified(|current| {
            let ended = matches!(current, SessionState::Closed | SessionState::Disconnected);
            if ended || *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }
}

//! Session manager
//!
//! One slot per configured target. Connects for the same target are
//! serialized on the slot's gate. A caller that queued behind an attempt
//! takes that attempt's outcome, the session or a copy of its error, so every
//! caller returns within one connect window. Different targets never contend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::Duration;

use tokio::time::Instant;

use crate::config::{TargetConfig, TargetRegistry};
use crate::error::{SessionError, SessionResult, TransportError};
use crate::transport::Connector;

use super::{Session, SessionState};

#[derive(Default)]
struct Slot {
    gate: tokio::sync::Mutex<()>,
    current: RwLock<Option<Arc<Session>>>,
    connecting: AtomicBool,
    /// Bumped each time an attempt finishes
    attempts: AtomicU64,
    last_failure: Mutex<Option<SessionError>>,
}

impl Slot {
    fn snapshot(&self) -> Option<Arc<Session>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, session: Arc<Session>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    fn record(&self, failure: Option<&SessionError>) {
        *self
            .last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = failure.map(replay);
        self.attempts.fetch_add(1, Ordering::SeqCst);
    }

    fn failure(&self) -> Option<SessionError> {
        self.last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(replay)
    }
}

/// Copy of a connect failure for callers that waited on the same attempt
fn replay(err: &SessionError) -> SessionError {
    match err {
        SessionError::UnknownTarget(name) => SessionError::UnknownTarget(name.clone()),
        SessionError::MissingAuth(name) => SessionError::MissingAuth(name.clone()),
        SessionError::NotConnected(name) => SessionError::NotConnected(name.clone()),
        SessionError::ConnectTimeout { target, secs } => SessionError::ConnectTimeout {
            target: target.clone(),
            secs: *secs,
        },
        SessionError::Connect { target, source } => SessionError::Connect {
            target: target.clone(),
            source: match source {
                TransportError::Auth(msg) => TransportError::Auth(msg.clone()),
                TransportError::Network(msg) => TransportError::Network(msg.clone()),
                TransportError::Channel(msg) => TransportError::Channel(msg.clone()),
                TransportError::Closed => TransportError::Closed,
                TransportError::Io(e) => {
                    TransportError::Io(std::io::Error::new(e.kind(), e.to_string()))
                }
            },
        },
    }
}

/// Keeps at most one live session per target
pub struct SessionManager {
    registry: Arc<TargetRegistry>,
    connector: Arc<dyn Connector>,
    connect_timeout: Duration,
    slots: HashMap<String, Slot>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("connector", &self.connector.connector_id())
            .field("connect_timeout", &self.connect_timeout)
            .field("targets", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a manager for every target in the registry
    #[must_use]
    pub fn new(
        registry: Arc<TargetRegistry>,
        connector: Arc<dyn Connector>,
        connect_timeout: Duration,
    ) -> Self {
        let slots = registry
            .iter()
            .map(|target| (target.name.clone(), Slot::default()))
            .collect();
        Self {
            registry,
            connector,
            connect_timeout,
            slots,
        }
    }

    /// Target registry shared with the rest of the system
    #[must_use]
    pub fn registry(&self) -> &Arc<TargetRegistry> {
        &self.registry
    }

    fn slot(&self, name: &str) -> SessionResult<&Slot> {
        self.slots
            .get(name)
            .ok_or_else(|| SessionError::UnknownTarget(name.to_string()))
    }

    /// Returns the ready session for `name`, connecting first if needed
    ///
    /// # Errors
    ///
    /// Returns `UnknownTarget`, `MissingAuth`, `ConnectTimeout` or `Connect`.
    /// Callers that arrive while an attempt is in flight share its result. A
    /// failed attempt leaves no session behind, so the next call retries.
    #[tracing::instrument(skip(self), fields(target_name = %name))]
    pub async fn connect(&self, name: &str) -> SessionResult<Arc<Session>> {
        let deadline = Instant::now() + self.connect_timeout;
        let slot = self.slot(name)?;
        if let Some(session) = slot.snapshot().filter(|s| s.is_ready()) {
            return Ok(session);
        }

        let seen = slot.attempts.load(Ordering::SeqCst);
        let _gate = tokio::time::timeout_at(deadline, slot.gate.lock())
            .await
            .map_err(|_| self.timeout_error(name))?;
        // Another caller may have connected while we waited
        if let Some(session) = slot.snapshot().filter(|s| s.is_ready()) {
            return Ok(session);
        }
        if slot.attempts.load(Ordering::SeqCst) != seen
            && let Some(failure) = slot.failure()
        {
            tracing::debug!(error = %failure, "Sharing result of concurrent attempt");
            return Err(failure);
        }

        let target = self
            .registry
            .get(name)
            .ok_or_else(|| SessionError::UnknownTarget(name.to_string()))?;
        if target.auth.is_none() {
            return Err(SessionError::MissingAuth(name.to_string()));
        }

        slot.connecting.store(true, Ordering::SeqCst);
        let result = self.open(target, deadline).await;
        slot.connecting.store(false, Ordering::SeqCst);
        slot.record(result.as_ref().err());

        let session = result?;
        slot.store(Arc::clone(&session));
        Ok(session)
    }

    fn timeout_error(&self, name: &str) -> SessionError {
        SessionError::ConnectTimeout {
            target: name.to_string(),
            secs: self.connect_timeout.as_secs(),
        }
    }

    async fn open(&self, target: &TargetConfig, deadline: Instant) -> SessionResult<Arc<Session>> {
        tracing::debug!(
            target_name = %target.name,
            host = %target.host,
            port = target.port,
            auth = target.auth.as_ref().map_or("none", |a| a.method_name()),
            connector = self.connector.connector_id(),
            "Connecting"
        );

        let transport = tokio::time::timeout_at(deadline, self.connector.connect(target))
            .await
            .map_err(|_| self.timeout_error(&target.name))?
            .map_err(|source| SessionError::Connect {
                target: target.name.clone(),
                source,
            })?;

        let session = Arc::new(Session::new(target.name.clone(), transport));
        watch_remote_close(Arc::downgrade(&session));
        tracing::info!(target_name = %target.name, host = %target.host, "Session ready");
        Ok(session)
    }

    /// Closes the session for `name`
    ///
    /// # Errors
    ///
    /// Returns `UnknownTarget` or `NotConnected` when no ready session exists.
    pub async fn disconnect(&self, name: &str) -> SessionResult<()> {
        let slot = self.slot(name)?;
        let _gate = slot.gate.lock().await;

        let session = slot
            .snapshot()
            .filter(|s| s.is_ready())
            .ok_or_else(|| SessionError::NotConnected(name.to_string()))?;

        // The closed session stays in the slot so its state remains observable
        session.mark(SessionState::Closed);
        if let Err(e) = session.transport().close().await {
            tracing::warn!(target_name = %name, error = %e, "Error closing transport");
        }
        tracing::info!(target_name = %name, "Session closed");
        Ok(())
    }

    /// Closes every ready session, logging failures and continuing
    pub async fn disconnect_all(&self) {
        for name in self.registry.names() {
            if !self.is_connected(name) {
                continue;
            }
            match self.disconnect(name).await {
                Ok(()) | Err(SessionError::NotConnected(_)) => {}
                Err(e) => tracing::warn!(target_name = %name, error = %e, "Failed to disconnect"),
            }
        }
    }

    /// Current state of the target's session, `None` if it never connected
    #[must_use]
    pub fn state(&self, name: &str) -> Option<SessionState> {
        let slot = self.slots.get(name)?;
        if slot.connecting.load(Ordering::SeqCst) {
            return Some(SessionState::Connecting);
        }
        slot.snapshot().map(|s| {
            if s.state().is_ready() && !s.is_ready() {
                SessionState::Disconnected
            } else {
                s.state()
            }
        })
    }

    /// Returns true if the target has a ready session
    #[must_use]
    pub fn is_connected(&self, name: &str) -> bool {
        self.slots
            .get(name)
            .and_then(Slot::snapshot)
            .is_some_and(|s| s.is_ready())
    }

    /// Number of targets with a ready session
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots
            .values()
            .filter_map(Slot::snapshot)
            .filter(|s| s.is_ready())
            .count()
    }
}

/// Marks the session `Disconnected` when its transport ends on its own
fn watch_remote_close(session: Weak<Session>) {
    let Some(transport) = session.upgrade().map(|s| Arc::clone(s.transport())) else {
        return;
    };
    tokio::spawn(async move {
        transport.closed().await;
        if let Some(session) = session.upgrade()
            && session.mark(SessionState::Disconnected)
        {
            tracing::warn!(target_name = %session.target_name(), "Session dropped by remote host");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ConnectBehavior, MockConnector};

    fn manager(connector: Arc<MockConnector>) -> SessionManager {
        let registry = TargetRegistry::new(vec![
            TargetConfig::new("staging", "10.0.0.5", "deploy").with_password("pw"),
            TargetConfig::new("nokey", "10.0.0.6", "deploy"),
        ])
        .unwrap();
        SessionManager::new(Arc::new(registry), connector, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_connect_reuses_ready_session() {
        let connector = Arc::new(MockConnector::new());
        let mgr = manager(Arc::clone(&connector));

        let a = mgr.connect("staging").await.unwrap();
        let b = mgr.connect("staging").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(connector.connect_count(), 1);
        assert_eq!(mgr.state("staging"), Some(SessionState::Ready));
    }

    #[tokio::test]
    async fn test_unknown_and_missing_auth() {
        let mgr = manager(Arc::new(MockConnector::new()));
        assert!(matches!(
            mgr.connect("nope").await,
            Err(SessionError::UnknownTarget(_))
        ));
        assert!(matches!(
            mgr.connect("nokey").await,
            Err(SessionError::MissingAuth(_))
        ));
        assert_eq!(mgr.state("nokey"), None);
    }

    #[tokio::test]
    async fn test_connect_timeout_leaves_no_session() {
        let connector = Arc::new(MockConnector::new());
        connector.set_behavior("staging", ConnectBehavior::Hang);
        let mgr = manager(Arc::clone(&connector));

        let err = mgr.connect("staging").await.unwrap_err();
        assert!(matches!(err, SessionError::ConnectTimeout { .. }));
        assert!(!mgr.is_connected("staging"));

        connector.set_behavior("staging", ConnectBehavior::Accept);
        assert!(mgr.connect("staging").await.is_ok());
        assert_eq!(connector.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_waiters_share_failed_attempt() {
        let connector = Arc::new(MockConnector::new());
        connector.set_behavior("staging", ConnectBehavior::Hang);
        let mgr = manager(Arc::clone(&connector));

        let started = std::time::Instant::now();
        let (a, b, c) = tokio::join!(
            mgr.connect("staging"),
            mgr.connect("staging"),
            mgr.connect("staging"),
        );
        assert!(started.elapsed() < Duration::from_millis(400));
        for result in [a, b, c] {
            assert!(matches!(result, Err(SessionError::ConnectTimeout { .. })));
        }
        assert_eq!(connector.connect_count(), 1);

        // A caller arriving after the failure starts a fresh attempt
        connector.set_behavior("staging", ConnectBehavior::Accept);
        assert!(mgr.connect("staging").await.is_ok());
        assert_eq!(connector.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_disconnect_then_not_connected() {
        let mgr = manager(Arc::new(MockConnector::new()));
        let session = mgr.connect("staging").await.unwrap();
        mgr.disconnect("staging").await.unwrap();

        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(mgr.state("staging"), Some(SessionState::Closed));
        assert!(!mgr.is_connected("staging"));
        assert!(matches!(
            mgr.disconnect("staging").await,
            Err(SessionError::NotConnected(_))
        ));
    }

    #[tokio::test]
    async fn test_remote_drop_marks_disconnected() {
        let connector = Arc::new(MockConnector::new());
        let mgr = manager(Arc::clone(&connector));
        let session = mgr.connect("staging").await.unwrap();
        let mut rx = session.subscribe();

        connector.last_transport("staging").unwrap().drop_remote();
        rx.wait_for(|s| *s == SessionState::Disconnected).await.unwrap();

        assert!(!mgr.is_connected("staging"));
        assert_eq!(mgr.active_count(), 0);
        let fresh = mgr.connect("staging").await.unwrap();
        assert!(!Arc::ptr_eq(&session, &fresh));
    }
}

//! Session lifecycle through the facade

use std::sync::Arc;
use std::time::{Duration, Instant};

use hostwatch_core::testing::{ConnectBehavior, FakeHost, RecordingNotifier, Reply};
use hostwatch_core::{SessionError, SessionState, TransportError};

use super::{fixture, fixture_with};

#[tokio::test]
async fn connect_twice_returns_same_session() {
    let fx = fixture(FakeHost::default());

    let first = fx.hub.connect("staging").await.unwrap();
    let second = fx.hub.connect("staging").await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(fx.connector.connect_count(), 1);
    assert_eq!(first.target_name(), "staging");
    assert_eq!(fx.hub.session_state("staging"), Some(SessionState::Ready));
}

#[tokio::test]
async fn concurrent_connects_share_one_transport() {
    let fx = fixture(FakeHost::default());
    fx.connector.set_behavior(
        "staging",
        ConnectBehavior::Delay(Duration::from_millis(50)),
    );

    let (a, b, c) = tokio::join!(
        fx.hub.connect("staging"),
        fx.hub.connect("staging"),
        fx.hub.connect("staging"),
    );
    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));
    assert_eq!(fx.connector.connect_count(), 1);
}

#[tokio::test]
async fn exec_connects_on_demand() {
    // Password target, connect then `echo hi`
    let host = FakeHost::default();
    let handler = Arc::new(move |command: &str| {
        if command == "echo hi" {
            Reply::ok("hi\n")
        } else {
            host.reply(command)
        }
    });
    let fx = fixture_with(handler, RecordingNotifier::default());
    fx.hub.connect("staging").await.unwrap();

    let transport = fx.connector.last_transport("staging").unwrap();
    let result = fx.hub.exec("staging", "echo hi", None).await.unwrap();
    assert_eq!(result.stdout, "hi");
    assert_eq!(result.exit_code, Some(0));
    assert!(result.signal.is_none());
    assert!(result.success);
    assert_eq!(transport.commands(), vec!["echo hi".to_string()]);
    assert_eq!(fx.connector.connect_count(), 1);
}

#[tokio::test]
async fn hanging_host_costs_one_connect_window() {
    let fx = fixture(FakeHost::default());
    fx.connector.set_behavior("staging", ConnectBehavior::Hang);

    let started = Instant::now();
    let (report, (user, user_elapsed)) = tokio::join!(fx.hub.monitor_server("staging"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let issued = Instant::now();
        let result = fx.hub.connect("staging").await;
        (result, issued.elapsed())
    });
    let tick_elapsed = started.elapsed();

    assert!(report.is_degraded());
    assert!(tick_elapsed < Duration::from_millis(1800), "tick took {tick_elapsed:?}");
    assert!(user_elapsed < Duration::from_millis(1500), "connect took {user_elapsed:?}");
    assert!(matches!(user, Err(SessionError::ConnectTimeout { secs: 1, .. })));
    assert_eq!(fx.connector.connect_count(), 1);
}

#[tokio::test]
async fn auth_rejection_is_a_connect_error() {
    let fx = fixture(FakeHost::default());
    fx.connector.set_behavior("staging", ConnectBehavior::RejectAuth);

    let err = fx.hub.connect("staging").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Connect {
            source: TransportError::Auth(_),
            ..
        }
    ));
    assert!(!fx.hub.sessions().is_connected("staging"));
}

#[tokio::test]
async fn connect_timeout_is_reported() {
    let fx = fixture(FakeHost::default());
    fx.connector.set_behavior("production", ConnectBehavior::Hang);

    let started = Instant::now();
    let err = fx.hub.connect("production").await.unwrap_err();
    assert!(matches!(err, SessionError::ConnectTimeout { secs: 1, .. }));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn unknown_target_is_rejected() {
    let fx = fixture(FakeHost::default());
    let err = fx.hub.connect("nope").await.unwrap_err();
    assert_eq!(err.to_string(), "Unknown target: nope");
    assert_eq!(fx.connector.connect_count(), 0);
}

#[tokio::test]
async fn disconnect_all_leaves_nothing_connected() {
    let fx = fixture(FakeHost::default());
    fx.hub.connect("staging").await.unwrap();
    fx.hub.connect("production").await.unwrap();
    assert_eq!(fx.hub.get_stats().active_connections, 2);

    fx.hub.disconnect_all().await;

    assert!(fx.hub.list_targets().iter().all(|t| !t.connected));
    assert_eq!(fx.hub.get_stats().active_connections, 0);
    assert_eq!(
        fx.connector.last_transport("staging").unwrap().close_calls(),
        1
    );
}

#[tokio::test]
async fn disconnect_without_session_fails() {
    let fx = fixture(FakeHost::default());
    assert!(matches!(
        fx.hub.disconnect("staging").await,
        Err(SessionError::NotConnected(_))
    ));
}

#[tokio::test]
async fn remote_drop_triggers_reconnect() {
    let fx = fixture(FakeHost::default());
    let session = fx.hub.connect("staging").await.unwrap();
    let mut states = session.subscribe();

    fx.connector.last_transport("staging").unwrap().drop_remote();
    states
        .wait_for(|s| *s == SessionState::Disconnected)
        .await
        .unwrap();

    let result = fx.hub.exec("staging", "uptime -p", None).await.unwrap();
    assert_eq!(result.stdout, "up 3 days, 4 hours");
    assert_eq!(fx.connector.connect_count(), 2);
}

#[tokio::test]
async fn disconnect_does_not_stop_monitoring() {
    let fx = fixture(FakeHost::default());
    fx.hub.connect("staging").await.unwrap();
    fx.hub.start_monitoring("staging", Some(60)).unwrap();

    fx.hub.disconnect("staging").await.unwrap();

    assert!(fx.hub.scheduler().is_monitoring("staging"));
    fx.hub.stop_all_monitoring();
}

//! Probes, monitoring ticks and the scheduler through the facade

use std::sync::Arc;
use std::time::Duration;

use hostwatch_core::testing::{ConnectBehavior, FakeHost, RecordingNotifier, Reply};
use hostwatch_core::{AlertLevel, MonitorError, ProbeError};

use super::{fixture, fixture_with};

#[tokio::test]
async fn status_reflects_probe_output() {
    let fx = fixture(FakeHost::default().with_cpu_usage(35.0).with_disk_usage(72));

    let status = fx.hub.get_status("production").await.unwrap();
    assert_eq!(status.target_name, "production");
    assert!((status.cpu_percent - 35.0).abs() < 0.01);
    assert!((status.mem_percent - 25.0).abs() < 0.01);
    assert!((status.disk_percent - 72.0).abs() < 0.01);
    assert_eq!(status.uptime, "up 3 days, 4 hours");
    assert!(status.healthy);
}

#[tokio::test]
async fn full_disk_is_unhealthy() {
    let fx = fixture(FakeHost::default().with_disk_usage(95));
    let status = fx.hub.get_status("production").await.unwrap();
    assert!(!status.healthy);
}

#[tokio::test]
async fn processes_are_sorted_and_limited() {
    let fx = fixture(FakeHost::default());

    let processes = fx.hub.get_processes("production", Some(2)).await.unwrap();
    assert_eq!(processes.len(), 2);
    assert_eq!(processes[0].pid, 1201);
    assert_eq!(processes[0].user, "root");
    assert!(processes[0].cpu_percent >= processes[1].cpu_percent);
    assert_eq!(processes[1].command, "nginx: worker process");
}

#[tokio::test]
async fn services_report_active_and_inactive() {
    // nginx active; app exits 3 with "failed" on stdout
    let host = FakeHost::default().with_active_services(["nginx"]);
    let handler = Arc::new(move |command: &str| {
        if command == "systemctl is-active app" {
            Reply::exit(3, "failed\n", "")
        } else {
            host.reply(command)
        }
    });
    let fx = fixture_with(handler, RecordingNotifier::default());

    let services = fx.hub.check_services("staging").await.unwrap();
    assert_eq!(services.len(), 2);
    assert_eq!(services[0].service, "nginx");
    assert!(services[0].active);
    assert_eq!(services[0].status.as_deref(), Some("active"));
    assert_eq!(services[1].service, "app");
    assert!(!services[1].active);
    assert_eq!(services[1].status.as_deref(), Some("failed"));
}

#[tokio::test]
async fn target_without_services_has_empty_list() {
    let fx = fixture(FakeHost::default());
    assert!(fx.hub.check_services("production").await.unwrap().is_empty());
}

#[tokio::test]
async fn services_of_unknown_target_fail() {
    let fx = fixture(FakeHost::default());
    assert!(matches!(
        fx.hub.check_services("ghost").await,
        Err(ProbeError::UnknownTarget(_))
    ));
}

#[tokio::test]
async fn recent_errors_are_counted_and_sampled() {
    let journal: Vec<String> = (1..=14)
        .map(|i| format!("Jan 01 10:00:{i:02} host app[42]: error {i}"))
        .collect();
    let fx = fixture(FakeHost::default().with_journal(journal));

    let summary = fx.hub.get_recent_errors("production", Some(50)).await;
    assert_eq!(summary.count, 14);
    assert_eq!(summary.samples.len(), 10);
    assert!(summary.error.is_none());

    let commands = fx.connector.last_transport("production").unwrap().commands();
    assert!(commands.iter().any(|c| c.contains("-n 50")));
}

#[tokio::test]
async fn unreadable_journal_yields_empty_summary() {
    let fx = fixture(FakeHost::default());
    fx.connector
        .set_behavior("production", ConnectBehavior::Unreachable);

    let summary = fx.hub.get_recent_errors("production", None).await;
    assert_eq!(summary.count, 0);
    assert!(summary.samples.is_empty());
    assert!(summary.error.is_some());
}

#[tokio::test]
async fn busy_host_with_failed_service_sends_one_alert() {
    // cpu 85, mem 50, disk 50, app inactive
    let host = FakeHost::default()
        .with_cpu_usage(85.0)
        .with_memory_usage(50)
        .with_disk_usage(50)
        .with_active_services(["nginx"]);
    let fx = fixture(host);

    let report = fx.hub.monitor_server("staging").await;

    assert!(!report.is_degraded());
    assert_eq!(report.alerts.len(), 2);
    assert_eq!(report.alerts[0].level, AlertLevel::Warning);
    assert!(report.alerts[0].message.contains("CPU alta: 85.0%"));
    assert_eq!(report.alerts[1].level, AlertLevel::Error);
    assert!(report.alerts[1].message.contains("app"));

    let sent = fx.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Alertas en servidor staging");
    assert!(sent[0].details_html.contains("CPU alta: 85.0%"));
    assert!(sent[0].details_html.contains("servicio(s) caído(s): app"));
}

#[tokio::test]
async fn quiet_host_sends_nothing() {
    let fx = fixture(FakeHost::default().with_active_services(["nginx", "app"]));

    let report = fx.hub.monitor_server("staging").await;

    assert!(report.alerts.is_empty());
    assert_eq!(report.processes.len(), 3);
    assert_eq!(report.errors.unwrap().count, 0);
    assert!(fx.notifier.sent().is_empty());
}

#[tokio::test]
async fn unreachable_host_gives_degraded_report() {
    let fx = fixture(FakeHost::default());
    fx.connector
        .set_behavior("production", ConnectBehavior::Unreachable);

    let report = fx.hub.monitor_server("production").await;

    assert!(report.is_degraded());
    assert!(report.errors.is_none());
    assert_eq!(report.alerts.len(), 1);
    assert!(report.alerts[0].message.starts_with("Error al monitorear:"));
    assert_eq!(fx.notifier.sent().len(), 1);
}

#[tokio::test]
async fn notifier_failure_does_not_break_tick() {
    let fx = fixture_with(
        FakeHost::default().with_disk_usage(97).into_handler(),
        RecordingNotifier::failing(),
    );

    let report = fx.hub.monitor_server("production").await;
    assert_eq!(report.alerts.len(), 1);
    assert_eq!(fx.notifier.sent().len(), 1);
}

#[tokio::test]
async fn start_twice_keeps_one_loop() {
    let fx = fixture(FakeHost::default());

    fx.hub.start_monitoring("production", Some(5)).unwrap();
    fx.hub.start_monitoring("production", Some(10)).unwrap();

    let stats = fx.hub.get_stats();
    assert_eq!(stats.active_monitoring, 1);
    let info = fx.hub.monitoring();
    assert_eq!(info.len(), 1);
    assert_eq!(info[0].interval_minutes, 5);

    assert_eq!(fx.hub.stop_all_monitoring(), 1);
}

#[tokio::test]
async fn first_tick_runs_immediately() {
    let fx = fixture(FakeHost::default().with_disk_usage(99));

    fx.hub.start_monitoring("production", Some(60)).unwrap();
    tokio::time::timeout(Duration::from_secs(2), async {
        while fx.notifier.sent().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    fx.hub.stop_monitoring("production").unwrap();
    assert!(!fx.hub.scheduler().is_monitoring("production"));
    assert_eq!(fx.notifier.sent().len(), 1);
}

#[tokio::test]
async fn stop_without_start_fails() {
    let fx = fixture(FakeHost::default());
    assert!(matches!(
        fx.hub.stop_monitoring("staging"),
        Err(MonitorError::NotMonitored(_))
    ));
}

#[tokio::test]
async fn start_on_unknown_target_fails() {
    let fx = fixture(FakeHost::default());
    assert!(matches!(
        fx.hub.start_monitoring("ghost", None),
        Err(MonitorError::UnknownTarget(_))
    ));
}

#[tokio::test]
async fn listing_reflects_connections_and_loops() {
    let fx = fixture(FakeHost::default());
    fx.hub.connect("staging").await.unwrap();
    fx.hub.start_monitoring("production", Some(15)).unwrap();

    let targets = fx.hub.list_targets();
    assert_eq!(targets.len(), 2);
    let staging = targets.iter().find(|t| t.name == "staging").unwrap();
    assert!(staging.connected);
    assert!(!staging.monitoring);
    assert_eq!(staging.services, vec!["nginx", "app"]);
    let production = targets.iter().find(|t| t.name == "production").unwrap();
    assert!(production.monitoring);
    assert_eq!(fx.hub.monitoring()[0].interval_minutes, 15);

    let stats = fx.hub.get_stats();
    assert_eq!(stats.total_targets, 2);
    assert_eq!(stats.active_monitoring, 1);

    fx.hub.shutdown().await;
    let stats = fx.hub.get_stats();
    assert_eq!(stats.active_monitoring, 0);
    assert_eq!(stats.active_connections, 0);
}

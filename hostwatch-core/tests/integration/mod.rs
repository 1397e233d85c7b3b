//! Shared fixtures for integration tests

mod config_tests;
mod exec_tests;
mod monitor_tests;
mod session_tests;

use std::sync::Arc;

use hostwatch_core::testing::{FakeHost, Handler, MockConnector, RecordingNotifier};
use hostwatch_core::{Hostwatch, MonitorSettings, TargetConfig, TargetRegistry};

/// Facade plus the doubles behind it
pub struct Fixture {
    pub hub: Hostwatch,
    pub connector: Arc<MockConnector>,
    pub notifier: Arc<RecordingNotifier>,
}

/// `staging` (password, watches nginx and app) and `production` (key, no services)
pub fn targets() -> Vec<TargetConfig> {
    vec![
        TargetConfig::new("staging", "10.0.0.5", "deploy")
            .with_password("s3cret")
            .with_services(["nginx", "app"]),
        TargetConfig::new("production", "192.168.1.100", "admin")
            .with_private_key("/home/ops/.ssh/id_ed25519", None),
    ]
}

pub fn fixture_with(handler: Handler, notifier: RecordingNotifier) -> Fixture {
    let connector = Arc::new(MockConnector::with_handler(handler));
    let notifier = Arc::new(notifier);
    let settings = MonitorSettings {
        connect_timeout_secs: 1,
        ..MonitorSettings::default()
    };
    let hub = Hostwatch::new(
        TargetRegistry::new(targets()).unwrap(),
        settings,
        Arc::clone(&connector) as Arc<dyn hostwatch_core::Connector>,
        Arc::clone(&notifier) as Arc<dyn hostwatch_core::Notifier>,
    );
    Fixture {
        hub,
        connector,
        notifier,
    }
}

pub fn fixture(host: FakeHost) -> Fixture {
    fixture_with(host.into_handler(), RecordingNotifier::default())
}

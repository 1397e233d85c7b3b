//! Property-based tests for alert evaluation

use hostwatch_core::{AlertLevel, ServerStatus, ServiceState, evaluate};
use proptest::prelude::*;

fn arb_services() -> impl Strategy<Value = Vec<ServiceState>> {
    prop::collection::vec(
        ("[a-z][a-z0-9-]{0,12}", any::<bool>()).prop_map(|(name, up)| {
            ServiceState::from_status(name, if up { "active" } else { "inactive" })
        }),
        0..8,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Alert count follows the thresholds and warnings precede errors
    #[test]
    fn prop_alerts_follow_thresholds(
        cpu in 0.0f64..=100.0,
        mem in 0.0f64..=100.0,
        disk in 0.0f64..=100.0,
        services in arb_services(),
    ) {
        let status = ServerStatus::new("host", cpu, mem, disk, "up 1 hour");
        let alerts = evaluate(&status, &services);

        let warnings = usize::from(cpu > 80.0) + usize::from(mem > 80.0);
        let any_down = services.iter().any(|s| !s.active);
        let errors = usize::from(disk > 90.0) + usize::from(any_down);
        prop_assert_eq!(alerts.len(), warnings + errors);

        let levels: Vec<AlertLevel> = alerts.iter().map(|a| a.level).collect();
        let first_error = levels.iter().position(|l| *l == AlertLevel::Error).unwrap_or(levels.len());
        prop_assert!(levels[first_error..].iter().all(|l| *l == AlertLevel::Error));
        prop_assert_eq!(first_error, warnings);
    }

    /// Down services are all named in a single alert
    #[test]
    fn prop_down_services_named(services in arb_services()) {
        let status = ServerStatus::new("host", 10.0, 10.0, 10.0, "up");
        let alerts = evaluate(&status, &services);
        let down: Vec<&ServiceState> = services.iter().filter(|s| !s.active).collect();

        if down.is_empty() {
            prop_assert!(alerts.is_empty());
        } else {
            prop_assert_eq!(alerts.len(), 1);
            let expected_prefix = format!("{} servicio(s)", down.len());
            prop_assert!(alerts[0].message.starts_with(&expected_prefix));
            for s in down {
                prop_assert!(alerts[0].message.contains(&s.service));
            }
        }
    }
}

//! Property-based tests for the target registry and interval clamping

use hostwatch_core::TargetConfig;
use hostwatch_core::TargetRegistry;
use hostwatch_core::config::clamp_minutes;
use proptest::prelude::*;

fn arb_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9-]{0,15}").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Distinct names load in order and resolve back to themselves
    #[test]
    fn prop_registry_preserves_order(names in prop::collection::hash_set(arb_name(), 1..12)) {
        let names: Vec<String> = names.into_iter().collect();
        let targets: Vec<TargetConfig> = names
            .iter()
            .map(|n| TargetConfig::new(n.clone(), "10.0.0.1", "ops").with_password("pw"))
            .collect();

        let registry = TargetRegistry::new(targets).unwrap();
        prop_assert_eq!(registry.len(), names.len());
        prop_assert_eq!(registry.names(), names.iter().map(String::as_str).collect::<Vec<_>>());
        for n in &names {
            prop_assert_eq!(&registry.get(n).unwrap().name, n);
        }
    }

    /// Any repeated name is rejected
    #[test]
    fn prop_registry_rejects_duplicates(name in arb_name(), extra in 0usize..4) {
        let mut targets = vec![TargetConfig::new(name.clone(), "h", "u")];
        for i in 0..extra {
            targets.push(TargetConfig::new(format!("{name}-{i}"), "h", "u"));
        }
        targets.push(TargetConfig::new(name, "h2", "u2"));
        prop_assert!(TargetRegistry::new(targets).is_err());
    }

    /// Intervals always land in 1..=1440
    #[test]
    fn prop_interval_clamped(minutes in any::<u32>()) {
        let clamped = clamp_minutes(minutes);
        prop_assert!((1..=1440).contains(&clamped));
        if (1..=1440).contains(&minutes) {
            prop_assert_eq!(clamped, minutes);
        }
    }
}

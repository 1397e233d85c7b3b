//! Loading targets and settings from files and the environment

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use hostwatch_core::{
    AuthSecret, ConfigError, ConfigProvider, EnvConfigProvider, FileConfigProvider, Hostwatch,
    HostwatchError, TargetRegistry, TracingNotifier,
};
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn hub_loads_targets_and_settings_from_file() {
    let file = write_config(
        r#"
[monitoring]
interval_minutes = 2
exec_timeout_secs = 12

[[targets]]
name = "staging"
host = "10.0.0.5"
username = "deploy"
password = "secret"
services = ["nginx", "app"]

[[targets]]
name = "production"
host = "192.168.1.100"
port = 2222
username = "admin"
key_path = "/home/ops/.ssh/id_ed25519"
passphrase = "hunter2"
"#,
    );

    let provider = FileConfigProvider::new(file.path());
    let hub = Hostwatch::from_provider(&provider, Arc::new(TracingNotifier)).unwrap();

    assert_eq!(hub.registry().names(), vec!["staging", "production"]);
    assert_eq!(hub.settings().interval_minutes, 2);
    assert_eq!(hub.executor().default_timeout().as_secs(), 12);

    let production = hub.registry().get("production").unwrap();
    assert_eq!(production.port, 2222);
    assert!(matches!(
        production.auth,
        Some(AuthSecret::PrivateKey {
            passphrase: Some(_),
            ..
        })
    ));

    let targets = hub.list_targets();
    assert!(targets.iter().all(|t| !t.connected && !t.monitoring));
}

#[test]
fn duplicate_names_are_rejected() {
    let file = write_config(
        r#"
[[targets]]
name = "web"
host = "a"
username = "u"

[[targets]]
name = "web"
host = "b"
username = "u"
"#,
    );

    let err = Hostwatch::from_provider(&FileConfigProvider::new(file.path()), Arc::new(TracingNotifier))
        .unwrap_err();
    assert!(matches!(
        err,
        HostwatchError::Config(ConfigError::DuplicateTarget(ref name)) if name == "web"
    ));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let file = write_config("[[targets]\nname = ");
    let provider = FileConfigProvider::new(file.path());
    assert!(matches!(
        provider.load_targets(),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn empty_file_has_defaults_and_no_targets() {
    let file = write_config("");
    let provider = FileConfigProvider::new(file.path());

    let settings = provider.load_settings().unwrap();
    assert_eq!(settings.interval_minutes, 5);
    assert!(TargetRegistry::from_provider(&provider).unwrap().is_empty());
}

#[test]
fn environment_targets_keep_declaration_order() {
    let vars: HashMap<String, String> = [
        ("SSH_SERVERS", "web-1, db"),
        ("SSH_WEB_1_HOST", "10.0.0.7"),
        ("SSH_WEB_1_USER", "deploy"),
        ("SSH_WEB_1_PASSWORD", "pw"),
        ("SSH_DB_HOST", "10.0.0.8"),
        ("SSH_DB_USER", "postgres"),
        ("SSH_DB_KEY", "/keys/db"),
        ("SSH_DB_SERVICES", "postgresql"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let registry = TargetRegistry::from_provider(&EnvConfigProvider::from_vars(vars)).unwrap();

    assert_eq!(registry.names(), vec!["web-1", "db"]);
    let db = registry.get("db").unwrap();
    assert_eq!(db.watched_services, vec!["postgresql"]);
    assert_eq!(db.destination(), "postgres@10.0.0.8");
}

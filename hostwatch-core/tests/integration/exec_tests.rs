//! Command and script execution through the facade

use std::sync::Arc;
use std::time::{Duration, Instant};

use hostwatch_core::testing::{RecordingNotifier, Reply};
use hostwatch_core::{ChannelOutput, ExecError, SessionError};

use super::fixture_with;

fn sleepy_handler() -> hostwatch_core::testing::Handler {
    Arc::new(|command: &str| {
        if command.starts_with("sleep") {
            Reply::Delayed(
                Duration::from_secs(5),
                ChannelOutput {
                    exit_code: Some(0),
                    ..ChannelOutput::default()
                },
            )
        } else {
            Reply::ok("fine\n")
        }
    })
}

#[tokio::test]
async fn slow_command_times_out_and_releases_channel() {
    let fx = fixture_with(sleepy_handler(), RecordingNotifier::default());

    let started = Instant::now();
    let err = fx
        .hub
        .exec("production", "sleep 5", Some(Duration::from_millis(1000)))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_timeout());
    assert_eq!(err.to_string(), "Timeout executing command");
    assert!(elapsed >= Duration::from_millis(1000));
    assert!(elapsed < Duration::from_millis(1500));

    let transport = fx.connector.last_transport("production").unwrap();
    assert_eq!(transport.open_channels(), 0);
    assert!(fx.hub.sessions().is_connected("production"));

    let next = fx.hub.exec("production", "true", None).await.unwrap();
    assert_eq!(next.stdout, "fine");
}

#[tokio::test]
async fn non_zero_exit_is_a_result_not_an_error() {
    let handler = Arc::new(|_: &str| Reply::exit(2, "", "no such file\n"));
    let fx = fixture_with(handler, RecordingNotifier::default());

    let result = fx.hub.exec("staging", "cat /missing", None).await.unwrap();
    assert!(!result.success);
    assert_eq!(result.exit_code, Some(2));
    assert_eq!(result.stderr, "no such file");
}

#[tokio::test]
async fn killed_command_reports_signal() {
    let handler = Arc::new(|_: &str| Reply::signal("KILL"));
    let fx = fixture_with(handler, RecordingNotifier::default());

    let result = fx.hub.exec("staging", "yes", None).await.unwrap();
    assert!(!result.success);
    assert_eq!(result.signal.as_deref(), Some("KILL"));
}

#[tokio::test]
async fn exec_on_unknown_target_fails() {
    let fx = fixture_with(sleepy_handler(), RecordingNotifier::default());
    let err = fx.hub.exec("ghost", "true", None).await.unwrap_err();
    assert!(matches!(
        err,
        ExecError::Session(SessionError::UnknownTarget(_))
    ));
}

#[tokio::test]
async fn script_is_uploaded_run_and_removed() {
    let handler = Arc::new(|command: &str| {
        if command.starts_with("'/tmp/hostwatch-script-") {
            Reply::ok("deployed\n")
        } else {
            Reply::ok("")
        }
    });
    let fx = fixture_with(handler, RecordingNotifier::default());

    let result = fx
        .hub
        .exec_script("staging", "#!/bin/sh\necho deployed\n", Some("deploy"))
        .await
        .unwrap();
    assert_eq!(result.stdout, "deployed");

    let commands = fx.connector.last_transport("staging").unwrap().commands();
    assert_eq!(commands.len(), 4);
    assert!(commands[0].starts_with("cat > '/tmp/hostwatch-script-deploy-"));
    assert!(commands[0].contains("echo deployed"));
    assert!(commands[1].starts_with("chmod +x '/tmp/hostwatch-script-deploy-"));
    assert!(commands[3].starts_with("rm -f '/tmp/hostwatch-script-deploy-"));
}

#[tokio::test]
async fn failed_upload_still_cleans_up() {
    let handler = Arc::new(|command: &str| {
        if command.starts_with("cat >") {
            Reply::exit(1, "", "No space left on device")
        } else {
            Reply::ok("")
        }
    });
    let fx = fixture_with(handler, RecordingNotifier::default());

    let err = fx
        .hub
        .exec_script("staging", "echo hi", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ExecError::ScriptUpload { .. }));

    let commands = fx.connector.last_transport("staging").unwrap().commands();
    assert!(commands.last().unwrap().starts_with("rm -f "));
}

#[tokio::test]
async fn script_label_is_validated() {
    let fx = fixture_with(sleepy_handler(), RecordingNotifier::default());
    let err = fx
        .hub
        .exec_script("staging", "echo hi", Some("../etc"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecError::InvalidLabel(_)));
}

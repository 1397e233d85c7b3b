//! Alert delivery
//!
//! The scheduler hands each tick's alerts to a [`Notifier`] exactly once. The
//! message is rendered here so every backend receives the same title, summary
//! and HTML body.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::alert::Alert;
use crate::error::{NotifyError, NotifyResult};
use crate::probe::ServerStatus;

/// Upper bound for one command notifier run
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Receives alerts for delivery
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one alert message
    async fn send_alert(&self, title: &str, summary: &str, details_html: &str) -> NotifyResult<()>;

    /// Identifier for logs
    fn notifier_id(&self) -> &'static str;
}

/// Title of the alert message for a target
#[must_use]
pub fn render_title(target_name: &str) -> String {
    format!("Alertas en servidor {target_name}")
}

/// One-line summary of the alert message
#[must_use]
pub fn render_summary(alert_count: usize) -> String {
    format!("Se detectaron {alert_count} problemas en el servidor")
}

/// HTML body: the alert list, then raw figures when a status is available
#[must_use]
pub fn render_details(alerts: &[Alert], status: Option<&ServerStatus>) -> String {
    let mut html = String::from("<ul>");
    for alert in alerts {
        html.push_str("<li><strong>");
        html.push_str(alert.level.icon());
        html.push_str("</strong> ");
        html.push_str(&escape_html(&alert.message));
        html.push_str("</li>");
    }
    html.push_str("</ul>");

    if let Some(status) = status {
        html.push_str(&format!(
            "<p><strong>CPU:</strong> {:.1}%</p><p><strong>Memoria:</strong> {:.1}%</p><p><strong>Disco:</strong> {:.1}%</p>",
            status.cpu_percent, status.mem_percent, status.disk_percent
        ));
    }
    html
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Logs alerts at `warn`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send_alert(&self, title: &str, summary: &str, details_html: &str) -> NotifyResult<()> {
        tracing::warn!(title = %title, summary = %summary, details = %details_html, "Alert");
        Ok(())
    }

    fn notifier_id(&self) -> &'static str {
        "tracing"
    }
}

/// Runs a local program per alert
///
/// The program receives the title and summary as its two arguments and the
/// HTML details on stdin. A non-zero exit is a delivery failure.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl CommandNotifier {
    /// Creates a notifier for `program`
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Arguments placed before the title and summary
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    async fn deliver(&self, title: &str, summary: &str, details_html: &str) -> NotifyResult<()> {
        let mut child = Command::new(&self.program)
            .args(&self.extra_args)
            .arg(title)
            .arg(summary)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(details_html.as_bytes()).await?;
            // Close stdin so the program sees EOF
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(NotifyError::Delivery {
                backend: self.notifier_id(),
                reason: format!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn send_alert(&self, title: &str, summary: &str, details_html: &str) -> NotifyResult<()> {
        tokio::time::timeout(COMMAND_TIMEOUT, self.deliver(title, summary, details_html))
            .await
            .map_err(|_| NotifyError::Delivery {
                backend: self.notifier_id(),
                reason: format!("{} timed out", self.program.display()),
            })?
    }

    fn notifier_id(&self) -> &'static str {
        "command"
    }
}

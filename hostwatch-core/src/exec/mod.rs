//! Remote command and script execution
//!
//! Commands run on a fresh channel of the target's session (connecting on
//! demand). The timeout covers the whole channel; when it elapses the channel
//! future is dropped, which closes the channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::{ExecError, ExecResult};
use crate::session::SessionManager;
use crate::transport::ChannelOutput;

/// Default command timeout
pub const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one remote command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    /// Exit code, if the command exited normally
    pub exit_code: Option<i32>,
    /// Signal name, if the command was killed
    pub signal: Option<String>,
    /// Trimmed standard output
    pub stdout: String,
    /// Trimmed standard error
    pub stderr: String,
    /// True iff the command exited with 0 and no signal
    pub success: bool,
}

impl From<ChannelOutput> for CommandResult {
    fn from(output: ChannelOutput) -> Self {
        let success = output.exit_code == Some(0) && output.signal.is_none();
        Self {
            exit_code: output.exit_code,
            signal: output.signal,
            stdout: output.stdout.trim().to_string(),
            stderr: output.stderr.trim().to_string(),
            success,
        }
    }
}

/// Runs commands and scripts on targets
#[derive(Debug)]
pub struct CommandExecutor {
    sessions: Arc<SessionManager>,
    default_timeout: Duration,
    script_seq: AtomicU64,
}

impl CommandExecutor {
    /// Creates an executor on top of the session manager
    #[must_use]
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self::with_default_timeout(sessions, DEFAULT_EXEC_TIMEOUT)
    }

    /// Creates an executor with a custom default timeout
    #[must_use]
    pub fn with_default_timeout(sessions: Arc<SessionManager>, default_timeout: Duration) -> Self {
        Self {
            sessions,
            default_timeout,
            script_seq: AtomicU64::new(0),
        }
    }

    /// Session manager used by this executor
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Default timeout applied when none is given
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Runs `command` on `target`
    ///
    /// A non-zero exit is reported in the result, not as an error.
    ///
    /// # Errors
    ///
    /// Returns a session error if the target cannot be connected, `Timeout`
    /// if the channel does not close in time, or `Channel` if it fails.
    #[tracing::instrument(skip(self, command), fields(target_name = %target))]
    pub async fn exec(
        &self,
        target: &str,
        command: &str,
        timeout: Option<Duration>,
    ) -> ExecResult<CommandResult> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let session = self.sessions.connect(target).await?;

        let started = std::time::Instant::now();
        tracing::debug!(command = %command, "Executing command");
        let output = tokio::time::timeout(timeout, session.transport().exec(command))
            .await
            .map_err(|_| ExecError::Timeout {
                target: target.to_string(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })?
            .map_err(|source| ExecError::Channel {
                target: target.to_string(),
                source,
            })?;

        let result = CommandResult::from(output);
        tracing::debug!(
            exit_code = ?result.exit_code,
            success = result.success,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Command finished"
        );
        Ok(result)
    }

    /// Uploads `content` as a temporary script, runs it and removes it
    ///
    /// `label` ends up in the remote file name and must only contain ASCII
    /// letters, digits, `-` and `_`. Removal is attempted whatever the
    /// outcome; a removal failure is logged and never replaces the result.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLabel`, `ScriptUpload`, or any [`exec`](Self::exec)
    /// error from the upload or run step.
    pub async fn exec_script(
        &self,
        target: &str,
        content: &str,
        label: Option<&str>,
    ) -> ExecResult<CommandResult> {
        let label = label.unwrap_or("script");
        if !is_valid_label(label) {
            return Err(ExecError::InvalidLabel(label.to_string()));
        }

        let seq = self.script_seq.fetch_add(1, Ordering::Relaxed);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        let path = format!("/tmp/hostwatch-script-{label}-{millis}-{seq}.sh");

        let result = self.upload_and_run(target, content, &path, seq).await;

        let cleanup = format!("rm -f '{path}'");
        match self.exec(target, &cleanup, None).await {
            Ok(r) if r.success => {}
            Ok(r) => tracing::warn!(target_name = %target, path = %path, stderr = %r.stderr, "Failed to remove script"),
            Err(e) => tracing::warn!(target_name = %target, path = %path, error = %e, "Failed to remove script"),
        }

        result
    }

    async fn upload_and_run(
        &self,
        target: &str,
        content: &str,
        path: &str,
        seq: u64,
    ) -> ExecResult<CommandResult> {
        let upload = heredoc_upload(path, content, seq);
        let written = self.exec(target, &upload, None).await?;
        if !written.success {
            return Err(ExecError::ScriptUpload {
                target: target.to_string(),
                reason: failure_reason(&written),
            });
        }

        let chmod = self.exec(target, &format!("chmod +x '{path}'"), None).await?;
        if !chmod.success {
            return Err(ExecError::ScriptUpload {
                target: target.to_string(),
                reason: failure_reason(&chmod),
            });
        }

        tracing::info!(target_name = %target, path = %path, "Running uploaded script");
        self.exec(target, &format!("'{path}'"), None).await
    }
}

/// Writes `content` verbatim to `path` with a quoted heredoc
///
/// The delimiter is quoted, so the body is never expanded by the remote
/// shell, and carries the upload sequence number.
pub(crate) fn heredoc_upload(path: &str, content: &str, seq: u64) -> String {
    let delimiter = format!("HOSTWATCH_EOF_{seq}");
    let body = if content.ends_with('\n') {
        content.to_string()
    } else {
        format!("{content}\n")
    };
    format!("cat > '{path}' << '{delimiter}'\n{body}{delimiter}")
}

fn failure_reason(result: &CommandResult) -> String {
    if result.stderr.is_empty() {
        match (&result.exit_code, &result.signal) {
            (_, Some(signal)) => format!("killed by {signal}"),
            (Some(code), None) => format!("exit status {code}"),
            (None, None) => "unknown failure".to_string(),
        }
    } else {
        result.stderr.clone()
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

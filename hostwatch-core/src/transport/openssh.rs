//! OpenSSH transport
//!
//! Each session is an OpenSSH `ControlMaster` process (`ssh -M -N`) bound to a
//! private control socket. Commands run as short-lived `ssh -S <socket>`
//! clients that multiplex over the master, so authentication happens once per
//! session. Password and key-passphrase authentication go through
//! `sshpass -e` when it is installed.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::{oneshot, watch};

use crate::config::{AuthSecret, TargetConfig};
use crate::error::{TransportError, TransportResult};

use super::{ChannelOutput, Connector, Transport};

/// Interval between master readiness checks
const READY_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Keepalive interval sent by the master (seconds)
const SERVER_ALIVE_INTERVAL_SECS: u32 = 15;

/// Missed keepalives before the master gives up
const SERVER_ALIVE_COUNT_MAX: u32 = 3;

/// Exit status OpenSSH uses for its own failures
const SSH_FAILURE_EXIT: i32 = 255;

/// Connects to targets with the system OpenSSH client
#[derive(Debug)]
pub struct OpenSshConnector {
    ssh_program: PathBuf,
    sshpass_available: bool,
    control_dir: PathBuf,
    connect_timeout_secs: u64,
    seq: AtomicU64,
}

impl Default for OpenSshConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenSshConnector {
    /// Creates a connector using `ssh` from `PATH`
    ///
    /// `sshpass` availability is checked once here rather than per connect.
    #[must_use]
    pub fn new() -> Self {
        let sshpass_available = std::process::Command::new("sshpass")
            .arg("-V")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok();

        Self {
            ssh_program: PathBuf::from("ssh"),
            sshpass_available,
            control_dir: std::env::temp_dir(),
            connect_timeout_secs: 10,
            seq: AtomicU64::new(0),
        }
    }

    /// Overrides the directory holding control sockets
    #[must_use]
    pub fn with_control_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.control_dir = dir.into();
        self
    }

    /// Sets the TCP connect timeout passed to `ssh`
    #[must_use]
    pub const fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Returns true if `sshpass` was found at construction time
    #[must_use]
    pub const fn sshpass_available(&self) -> bool {
        self.sshpass_available
    }

    fn next_control_path(&self) -> PathBuf {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.control_dir
            .join(format!("hostwatch-{}-{seq}.ctl", std::process::id()))
    }

    /// Builds the master process command for a target
    fn master_command(
        &self,
        target: &TargetConfig,
        control_path: &Path,
    ) -> TransportResult<Command> {
        let auth = target
            .auth
            .as_ref()
            .ok_or_else(|| TransportError::Auth("no authentication method".to_string()))?;

        let needs_sshpass = match auth {
            AuthSecret::Password(_) => true,
            AuthSecret::PrivateKey { passphrase, .. } => passphrase.is_some(),
        };
        if needs_sshpass && !self.sshpass_available {
            return Err(TransportError::Auth(format!(
                "sshpass is required for {} authentication with a secret",
                auth.method_name()
            )));
        }

        let mut cmd = if needs_sshpass {
            let mut cmd = Command::new("sshpass");
            match auth {
                AuthSecret::Password(password) => {
                    cmd.env("SSHPASS", password.expose_secret());
                }
                AuthSecret::PrivateKey {
                    passphrase: Some(passphrase),
                    ..
                } => {
                    // Match the key passphrase prompt instead of the password prompt
                    cmd.arg("-P").arg("passphrase");
                    cmd.env("SSHPASS", passphrase.expose_secret());
                }
                AuthSecret::PrivateKey { .. } => {}
            }
            cmd.arg("-e").arg(&self.ssh_program);
            cmd
        } else {
            let mut cmd = Command::new(&self.ssh_program);
            cmd.arg("-o").arg("BatchMode=yes");
            cmd
        };

        cmd.arg("-M").arg("-N");
        cmd.arg("-o").arg("ControlMaster=yes");
        cmd.arg("-o").arg(format!("ControlPath={}", control_path.display()));
        cmd.arg("-o").arg("ControlPersist=no");
        cmd.arg("-o").arg("StrictHostKeyChecking=accept-new");
        cmd.arg("-o")
            .arg(format!("ConnectTimeout={}", self.connect_timeout_secs));
        cmd.arg("-o")
            .arg(format!("ServerAliveInterval={SERVER_ALIVE_INTERVAL_SECS}"));
        cmd.arg("-o")
            .arg(format!("ServerAliveCountMax={SERVER_ALIVE_COUNT_MAX}"));

        match auth {
            AuthSecret::Password(_) => {
                cmd.arg("-o").arg("PreferredAuthentications=password,keyboard-interactive");
                cmd.arg("-o").arg("PubkeyAuthentication=no");
            }
            AuthSecret::PrivateKey { key_path, .. } => {
                cmd.arg("-o").arg("IdentitiesOnly=yes");
                cmd.arg("-i").arg(key_path);
            }
        }

        cmd.arg("-p").arg(target.port.to_string());
        cmd.arg("--").arg(target.destination());

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        Ok(cmd)
    }

    /// Asks the master whether it is ready to multiplex
    async fn master_ready(&self, target: &TargetConfig, control_path: &Path) -> bool {
        Command::new(&self.ssh_program)
            .arg("-S")
            .arg(control_path)
            .arg("-O")
            .arg("check")
            .arg("-p")
            .arg(target.port.to_string())
            .arg("--")
            .arg(target.destination())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .is_ok_and(|status| status.success())
    }
}

#[async_trait]
impl Connector for OpenSshConnector {
    async fn connect(&self, target: &TargetConfig) -> TransportResult<Arc<dyn Transport>> {
        let control_path = self.next_control_path();
        let mut child = self.master_command(target, &control_path)?.spawn()?;
        let mut stderr = child.stderr.take();

        loop {
            if let Some(status) = child.try_wait()? {
                let mut message = String::new();
                if let Some(ref mut pipe) = stderr {
                    let _ = pipe.read_to_string(&mut message).await;
                }
                return Err(classify_master_failure(status.code(), message.trim()));
            }
            if self.master_ready(target, &control_path).await {
                break;
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }

        let (closed_tx, closed_rx) = watch::channel(false);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(supervise_master(
            target.name.clone(),
            child,
            stderr,
            shutdown_rx,
            closed_tx,
        ));

        Ok(Arc::new(OpenSshTransport {
            ssh_program: self.ssh_program.clone(),
            destination: target.destination(),
            port: target.port,
            control_path,
            closed_rx,
            shutdown: Mutex::new(Some(shutdown_tx)),
        }))
    }

    fn connector_id(&self) -> &'static str {
        "openssh"
    }
}

/// Owns the master process until it exits or a shutdown is requested.
///
/// Dropping the shutdown sender (the transport went away) also kills the
/// master. Stderr is drained so the master never blocks on a full pipe.
async fn supervise_master(
    target_name: String,
    mut child: Child,
    stderr: Option<ChildStderr>,
    shutdown_rx: oneshot::Receiver<()>,
    closed_tx: watch::Sender<bool>,
) {
    let drain = async {
        if let Some(pipe) = stderr {
            let mut lines = BufReader::new(pipe).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(target_name = %target_name, %line, "ssh master");
            }
        }
        std::future::pending::<()>().await;
    };

    tokio::select! {
        status = child.wait() => {
            tracing::info!(
                target_name = %target_name,
                status = ?status.ok().and_then(|s| s.code()),
                "SSH master exited"
            );
        }
        _ = shutdown_rx => {
            if let Err(e) = child.kill().await {
                tracing::debug!(target_name = %target_name, error = %e, "Failed to kill ssh master");
            }
        }
        () = drain => {}
    }

    closed_tx.send_replace(true);
}

fn classify_master_failure(code: Option<i32>, stderr: &str) -> TransportError {
    let detail = if stderr.is_empty() {
        format!("ssh exited with status {}", code.map_or_else(|| "?".to_string(), |c| c.to_string()))
    } else {
        stderr.to_string()
    };

    if stderr.contains("Permission denied") || stderr.contains("Too many authentication failures")
    {
        TransportError::Auth(detail)
    } else if matches!(code, Some(5 | 6)) {
        // sshpass: 5 = wrong password, 6 = host key unknown
        TransportError::Auth(detail)
    } else {
        TransportError::Network(detail)
    }
}

/// Live OpenSSH master session
struct OpenSshTransport {
    ssh_program: PathBuf,
    destination: String,
    port: u16,
    control_path: PathBuf,
    closed_rx: watch::Receiver<bool>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

impl OpenSshTransport {
    fn mux_command(&self) -> Command {
        let mut cmd = Command::new(&self.ssh_program);
        cmd.arg("-S")
            .arg(&self.control_path)
            .arg("-o")
            .arg("ControlMaster=no")
            .arg("-o")
            .arg("BatchMode=yes")
            .arg("-p")
            .arg(self.port.to_string());
        cmd
    }
}

#[async_trait]
impl Transport for OpenSshTransport {
    async fn exec(&self, command: &str) -> TransportResult<ChannelOutput> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let mut cmd = self.mux_command();
        cmd.arg("-T")
            .arg("--")
            .arg(&self.destination)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = cmd.output().await?;
        let code = output.status.code();

        if code == Some(SSH_FAILURE_EXIT) && self.is_closed() {
            return Err(TransportError::Closed);
        }

        Ok(ChannelOutput {
            exit_code: code,
            signal: termination_signal(&output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn close(&self) -> TransportResult<()> {
        if !self.is_closed() {
            let status = self
                .mux_command()
                .arg("-O")
                .arg("exit")
                .arg("--")
                .arg(&self.destination)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .status()
                .await;
            if let Err(e) = status {
                tracing::debug!(error = %e, "ssh -O exit failed, killing master");
            }
        }

        let sender = self
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sender) = sender {
            let _ = sender.send(());
        }

        self.closed().await;
        Ok(())
    }

    async fn closed(&self) {
        let mut rx = self.closed_rx.clone();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    fn is_closed(&self) -> bool {
        *self.closed_rx.borrow()
    }
}

#[cfg(unix)]
fn termination_signal(status: &std::process::ExitStatus) -> Option<String> {
    use std::os::unix::process::ExitStatusExt;

    status.signal().map(|sig| {
        match sig {
            1 => "SIGHUP",
            2 => "SIGINT",
            9 => "SIGKILL",
            13 => "SIGPIPE",
            15 => "SIGTERM",
            _ => return format!("SIG{sig}"),
        }
        .to_string()
    })
}

#[cfg(not(unix))]
fn termination_signal(_status: &std::process::ExitStatus) -> Option<String> {
    None
}

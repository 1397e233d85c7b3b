//! Host health snapshot and process sampling

use std::sync::Arc;

use crate::error::{ProbeError, ProbeResult};
use crate::exec::{CommandExecutor, CommandResult};

use super::models::{ProcessSample, ServerStatus};
use super::parser::{CPU_COMMAND, DISK_COMMAND, MEMORY_COMMAND, ProbeParser, UPTIME_COMMAND};

/// Default number of processes returned by [`HealthProbe::get_processes`]
pub const DEFAULT_PROCESS_LIMIT: usize = 10;

/// Derives CPU, memory, disk and uptime figures for a target
#[derive(Debug, Clone)]
pub struct HealthProbe {
    executor: Arc<CommandExecutor>,
}

impl HealthProbe {
    /// Creates a probe on top of the executor
    #[must_use]
    pub const fn new(executor: Arc<CommandExecutor>) -> Self {
        Self { executor }
    }

    async fn run(&self, target: &str, probe: &'static str, command: &str) -> ProbeResult<CommandResult> {
        self.executor
            .exec(target, command, None)
            .await
            .map_err(|source| ProbeError::Exec { probe, source })
    }

    /// Takes a status snapshot
    ///
    /// The four metric commands run concurrently. A metric whose output
    /// cannot be parsed reads as `0`.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Exec` if any command could not be executed.
    pub async fn get_status(&self, target: &str) -> ProbeResult<ServerStatus> {
        let (cpu, memory, disk, uptime) = tokio::try_join!(
            self.run(target, "cpu", CPU_COMMAND),
            self.run(target, "memory", MEMORY_COMMAND),
            self.run(target, "disk", DISK_COMMAND),
            self.run(target, "uptime", UPTIME_COMMAND),
        )?;

        let status = ServerStatus::new(
            target,
            ProbeParser::parse_cpu(&cpu.stdout),
            ProbeParser::parse_memory(&memory.stdout),
            ProbeParser::parse_disk(&disk.stdout),
            uptime.stdout,
        );
        tracing::debug!(
            target_name = %target,
            cpu = status.cpu_percent,
            memory = status.mem_percent,
            disk = status.disk_percent,
            healthy = status.healthy,
            "Status sampled"
        );
        Ok(status)
    }

    /// Returns up to `limit` processes, highest CPU first
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Exec` if the listing could not be executed.
    pub async fn get_processes(&self, target: &str, limit: usize) -> ProbeResult<Vec<ProcessSample>> {
        let output = self
            .run(target, "processes", &ProbeParser::processes_command(limit))
            .await?;
        Ok(ProbeParser::parse_processes(&output.stdout, limit))
    }
}

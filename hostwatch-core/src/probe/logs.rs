//! Recent journal errors

use std::sync::Arc;

use crate::exec::CommandExecutor;

use super::models::ErrorLogSummary;
use super::parser::ProbeParser;

/// Default number of journal lines scanned
pub const DEFAULT_ERROR_LINES: u32 = 50;

/// Lines kept in [`ErrorLogSummary::samples`]
pub const SAMPLE_LINES: usize = 10;

/// Reads the most recent `err`-priority journal entries
#[derive(Debug, Clone)]
pub struct ErrorLogScanner {
    executor: Arc<CommandExecutor>,
}

impl ErrorLogScanner {
    /// Creates a scanner on top of the executor
    #[must_use]
    pub const fn new(executor: Arc<CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Summarizes the last `lines` error entries
    ///
    /// Never fails: an unreadable journal yields an empty summary carrying
    /// the error message.
    pub async fn get_recent_errors(&self, target: &str, lines: u32) -> ErrorLogSummary {
        let command = format!("journalctl -p err -n {lines} --no-pager");
        let result = match self.executor.exec(target, &command, None).await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(target_name = %target, error = %e, "Journal query failed");
                return ErrorLogSummary::failed(e.to_string());
            }
        };

        let entries = ProbeParser::journal_lines(&result.stdout);
        ErrorLogSummary {
            count: entries.len(),
            samples: entries
                .iter()
                .take(SAMPLE_LINES)
                .map(|l| (*l).to_string())
                .collect(),
            error: None,
        }
    }
}

//! Parsers for probe command output
//!
//! Every numeric parser returns `0.0` on malformed input instead of failing,
//! so one broken metric never blanks a whole report.

use std::sync::LazyLock;

use regex::Regex;

use super::models::ProcessSample;

/// CPU line from `top` (busy = 100 - idle)
pub const CPU_COMMAND: &str = "top -bn1 | grep 'Cpu(s)'";
/// Memory line from `free`
pub const MEMORY_COMMAND: &str = "free | grep Mem";
/// Root filesystem line from `df` in POSIX format
pub const DISK_COMMAND: &str = "df -P / | tail -1";
/// Human-readable uptime
pub const UPTIME_COMMAND: &str = "uptime -p";

/// Number of fields in a well-formed `ps aux` row
const PS_FIELDS: usize = 11;

/// `NN.N id` or `NN.N%id` inside a `top` CPU line
static IDLE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"([0-9]+(?:[.,][0-9]+)?)\s*%?\s*id\b").ok());

/// Stateless parser for probe output
pub struct ProbeParser;

impl ProbeParser {
    /// Process listing sorted by CPU, header included
    #[must_use]
    pub fn processes_command(limit: usize) -> String {
        format!("ps aux --sort=-%cpu | head -{}", limit.saturating_add(1))
    }

    /// Parses the `top` CPU line into a busy percentage
    ///
    /// Format: `%Cpu(s):  3.1 us,  1.2 sy,  0.0 ni, 95.3 id, ...`
    #[must_use]
    pub fn parse_cpu(output: &str) -> f64 {
        let Some(re) = IDLE_RE.as_ref() else {
            return 0.0;
        };
        re.captures(output)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
            .filter(|idle| (0.0..=100.0).contains(idle))
            .map_or(0.0, |idle| 100.0 - idle)
    }

    /// Parses the `free` memory line into a used percentage
    ///
    /// Format: `Mem:  total  used  free  shared  buff/cache  available`
    #[must_use]
    pub fn parse_memory(output: &str) -> f64 {
        let Some(line) = output.lines().find(|l| l.trim_start().starts_with("Mem")) else {
            return 0.0;
        };
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            return 0.0;
        }
        let number = |raw: &str| raw.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0);
        let total = number(parts[1]);
        let used = number(parts[2]);
        if total <= 0.0 {
            return 0.0;
        }
        (used / total * 100.0).clamp(0.0, 100.0)
    }

    /// Parses the last `df -P` line into a used percentage
    ///
    /// Format: `Filesystem  1024-blocks  Used  Available  Capacity  Mounted`
    #[must_use]
    pub fn parse_disk(output: &str) -> f64 {
        output
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .and_then(|line| line.split_whitespace().nth(4))
            .and_then(|field| field.trim_end_matches('%').parse::<f64>().ok())
            .filter(|pct| (0.0..=100.0).contains(pct))
            .unwrap_or(0.0)
    }

    /// Parses `ps aux` output, skipping the header and malformed rows
    #[must_use]
    pub fn parse_processes(output: &str, limit: usize) -> Vec<ProcessSample> {
        output
            .lines()
            .skip(1)
            .filter_map(Self::parse_process_line)
            .take(limit)
            .collect()
    }

    fn parse_process_line(line: &str) -> Option<ProcessSample> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < PS_FIELDS {
            return None;
        }
        Some(ProcessSample {
            user: parts[0].to_string(),
            pid: parts[1].parse().ok()?,
            cpu_percent: parts[2].parse().unwrap_or(0.0),
            mem_percent: parts[3].parse().unwrap_or(0.0),
            command: parts[PS_FIELDS - 1..].join(" "),
        })
    }

    /// Journal lines that carry a message, without `-- ... --` markers
    #[must_use]
    pub fn journal_lines(output: &str) -> Vec<&str> {
        output
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty() && !l.starts_with("-- "))
            .collect()
    }
}

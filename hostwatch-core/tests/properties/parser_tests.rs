//! Property-based tests for probe output parsing

use hostwatch_core::probe::{ProbeParser, is_healthy};
use proptest::prelude::*;

fn arb_process_row() -> impl Strategy<Value = (String, u32, f64, String)> {
    (
        "[a-z][a-z0-9_-]{0,11}",
        1u32..4_000_000,
        0.0f64..400.0,
        "[a-zA-Z/][a-zA-Z0-9/:._ -]{0,40}",
    )
        .prop_map(|(user, pid, cpu, cmd)| (user, pid, (cpu * 10.0).round() / 10.0, cmd))
        .prop_filter("command must have text", |(_, _, _, cmd)| !cmd.trim().is_empty())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Arbitrary text never panics and stays within 0..=100
    #[test]
    fn prop_parsers_stay_in_range(output in ".{0,200}") {
        for value in [
            ProbeParser::parse_cpu(&output),
            ProbeParser::parse_memory(&output),
            ProbeParser::parse_disk(&output),
        ] {
            prop_assert!((0.0..=100.0).contains(&value), "got {value} for {output:?}");
        }
    }

    /// Busy CPU is the complement of the idle column
    #[test]
    fn prop_cpu_is_complement_of_idle(tenths in 0u32..=1000) {
        let idle = f64::from(tenths) / 10.0;
        let line = format!("%Cpu(s):  2.0 us,  1.0 sy,  0.0 ni, {idle:.1} id,  0.0 wa");
        let busy = ProbeParser::parse_cpu(&line);
        prop_assert!((busy - (100.0 - idle)).abs() < 1e-9);
    }

    /// Used memory never exceeds total, so the percentage is bounded
    #[test]
    fn prop_memory_ratio(total in 1u64..u64::from(u32::MAX), ratio in 0.0f64..=1.0) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let used = (total as f64 * ratio) as u64;
        let line = format!("Mem:  {total}  {used}  0  0  0  0");
        let pct = ProbeParser::parse_memory(&line);
        #[allow(clippy::cast_precision_loss)]
        let expected = used as f64 / total as f64 * 100.0;
        prop_assert!((pct - expected).abs() < 1e-6);
    }

    /// The capacity column is read regardless of the other columns
    #[test]
    fn prop_disk_capacity(pct in 0u32..=100, device in "/dev/[a-z]{3}[0-9]") {
        let line = format!("{device}  1000  500  500  {pct}% /");
        prop_assert!((ProbeParser::parse_disk(&line) - f64::from(pct)).abs() < f64::EPSILON);
    }

    /// Parsing honours the limit and skips the header
    #[test]
    fn prop_process_limit(rows in prop::collection::vec(arb_process_row(), 0..20), limit in 1usize..15) {
        let mut output = String::from("USER PID %CPU %MEM VSZ RSS TTY STAT START TIME COMMAND\n");
        for (user, pid, cpu, cmd) in &rows {
            output.push_str(&format!("{user} {pid} {cpu:.1} 0.5 1000 2000 ? S 10:00 0:01 {cmd}\n"));
        }

        let parsed = ProbeParser::parse_processes(&output, limit);
        prop_assert_eq!(parsed.len(), rows.len().min(limit));
        for (sample, (user, pid, _, cmd)) in parsed.iter().zip(&rows) {
            prop_assert_eq!(&sample.user, user);
            prop_assert_eq!(sample.pid, *pid);
            prop_assert_eq!(&sample.command, &cmd.split_whitespace().collect::<Vec<_>>().join(" "));
        }
    }

    /// Healthy means every metric is at or below 90
    #[test]
    fn prop_healthy_derivation(cpu in 0.0f64..=100.0, mem in 0.0f64..=100.0, disk in 0.0f64..=100.0) {
        let expected = cpu <= 90.0 && mem <= 90.0 && disk <= 90.0;
        prop_assert_eq!(is_healthy(cpu, mem, disk), expected);
    }

    /// Journal markers and blank lines are never counted
    #[test]
    fn prop_journal_lines_skip_markers(messages in prop::collection::vec("[a-z][a-z0-9 ]{0,30}", 0..30)) {
        let mut output = String::from("-- Logs begin at Mon 2024-01-01 --\n");
        for m in &messages {
            output.push_str(m);
            output.push_str("\n\n");
        }
        let lines = ProbeParser::journal_lines(&output);
        prop_assert_eq!(lines.len(), messages.len());
    }
}

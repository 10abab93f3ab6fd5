//! Tailing the external command log.
//!
//! `cmd_log.jsonl` is written by the shell hook and read-only here. Each
//! poll takes a snapshot: the total line count (the activity signal) and
//! the parsed tail window.

use std::path::Path;

use shellbuddy_core::CommandEvent;
use tracing::debug;

/// One poll's view of the command log.
#[derive(Debug, Clone, Default)]
pub struct LogSnapshot {
    /// Total non-empty lines in the log. New lines beyond the last
    /// observed count mean new activity.
    pub total: usize,

    /// The last `window` commands, oldest first. Malformed lines are
    /// skipped.
    pub recent: Vec<CommandEvent>,
}

impl LogSnapshot {
    /// Working directory of the most recent command, if any.
    pub fn cwd(&self) -> Option<&str> {
        self.recent.last().map(|c| c.cwd.as_str())
    }
}

/// Read the current snapshot. A missing or unreadable log means "no new
/// data this cycle", not an error.
pub fn read_tail(path: &Path, window: usize) -> Option<LogSnapshot> {
    let content = std::fs::read_to_string(path).ok()?;
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    let total = lines.len();

    let skip = total.saturating_sub(window);
    let mut recent = Vec::with_capacity(total - skip);
    let mut bad = 0usize;
    for line in &lines[skip..] {
        match serde_json::from_str::<CommandEvent>(line) {
            Ok(event) => recent.push(event),
            Err(_) => bad += 1,
        }
    }
    if bad > 0 {
        debug!(skipped = bad, "Skipped malformed command log lines");
    }

    Some(LogSnapshot { total, recent })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(cmd: &str, cwd: &str) -> String {
        format!(r#"{{"ts":"2025-01-01T10:00:00Z","cmd":"{cmd}","cwd":"{cwd}"}}"#)
    }

    #[test]
    fn missing_log_yields_none() {
        assert!(read_tail(Path::new("/nonexistent/cmd_log.jsonl"), 15).is_none());
    }

    #[test]
    fn tail_window_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmd_log.jsonl");
        let content: String = (0..20)
            .map(|i| line(&format!("echo {i}"), "/home/u"))
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(&path, content).unwrap();

        let snap = read_tail(&path, 5).unwrap();
        assert_eq!(snap.total, 20);
        assert_eq!(snap.recent.len(), 5);
        assert_eq!(snap.recent[0].cmd, "echo 15");
        assert_eq!(snap.recent[4].cmd, "echo 19");
        assert_eq!(snap.cwd(), Some("/home/u"));
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmd_log.jsonl");
        let content = format!("{}\nhalf a line\n{}\n", line("ls", "/a"), line("pwd", "/b"));
        std::fs::write(&path, content).unwrap();

        let snap = read_tail(&path, 15).unwrap();
        assert_eq!(snap.total, 3);
        assert_eq!(snap.recent.len(), 2);
        assert_eq!(snap.cwd(), Some("/b"));
    }
}

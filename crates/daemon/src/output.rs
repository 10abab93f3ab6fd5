//! Hint panel rendering.
//!
//! The panel is a small fixed-height text file, rewritten atomically on
//! every render cycle so a watcher (e.g. a tmux pane running `tail -f`
//! style redisplay) never sees a torn frame.

use std::path::Path;

use chrono::Local;
use shellbuddy_core::ContextError;
use shellbuddy_context::write_atomic;
use shellbuddy_kb::RankedHint;

/// Ambient lines shown below the separator dot.
const MAX_AMBIENT_LINES: usize = 5;

/// Character budget per ambient line.
const AMBIENT_LINE_BUDGET: usize = 65;

/// Render the full panel: header, rule separator, up to three reflex
/// hints, then either the ambient text or a thinking placeholder, padded
/// to `max_lines + 2` total lines.
pub fn render_panel(
    rule_hints: &[RankedHint],
    ambient: &str,
    cwd: &str,
    cmd_count: usize,
    thinking: bool,
    max_lines: usize,
) -> String {
    let ts = Local::now().format("%H:%M:%S");
    let cwd_short = shorten_home(cwd);
    let mut lines = vec![
        format!("HINTS  {cwd_short}  [{ts}]  ({cmd_count} cmds)"),
        "─".repeat(58),
    ];

    for hint in rule_hints.iter().take(3) {
        lines.push(hint.text.clone());
    }

    // an in-flight call always shows the placeholder, never stale text
    if thinking {
        if !rule_hints.is_empty() {
            lines.push("·".to_string());
        }
        lines.push("thinking ...".to_string());
    } else if !ambient.is_empty() {
        let ambient_lines: Vec<String> = ambient
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(MAX_AMBIENT_LINES)
            .map(|l| l.chars().take(AMBIENT_LINE_BUDGET).collect())
            .collect();
        if !ambient_lines.is_empty() {
            if !rule_hints.is_empty() {
                lines.push("·".to_string());
            }
            lines.extend(ambient_lines);
        }
    }

    let budget = max_lines + 2;
    lines.truncate(budget);
    while lines.len() < budget {
        lines.push(String::new());
    }
    lines.join("\n")
}

/// Write a rendered panel to its output target.
pub fn write_panel(path: &Path, panel: &str) -> Result<(), ContextError> {
    write_atomic(path, panel).map_err(|e| ContextError::Storage(e.to_string()))
}

fn shorten_home(cwd: &str) -> String {
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() && cwd.starts_with(&home) => {
            format!("~{}", &cwd[home.len()..])
        }
        _ => cwd.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellbuddy_core::Severity;

    fn hint(text: &str) -> RankedHint {
        RankedHint {
            rule_id: "t-001".into(),
            severity: Severity::Tip,
            text: text.into(),
        }
    }

    #[test]
    fn panel_has_fixed_height() {
        let panel = render_panel(&[], "", "/tmp", 3, false, 10);
        assert_eq!(panel.split('\n').count(), 12);
        assert!(panel.starts_with("HINTS  /tmp"));
        assert!(panel.contains("(3 cmds)"));
    }

    #[test]
    fn reflex_hints_come_before_ambient_text() {
        let hints = vec![hint("-> [2x] cat → bat README.md")];
        let panel = render_panel(&hints, "use bat for markdown\nsecond tip", "/tmp", 5, false, 10);
        let lines: Vec<&str> = panel.lines().collect();
        assert_eq!(lines[2], "-> [2x] cat → bat README.md");
        assert_eq!(lines[3], "·");
        assert_eq!(lines[4], "use bat for markdown");
        assert_eq!(lines[5], "second tip");
    }

    #[test]
    fn thinking_placeholder_shown_while_call_in_flight() {
        let hints = vec![hint("-> [1x] ls → eza")];
        let panel = render_panel(&hints, "", "/tmp", 5, true, 10);
        assert!(panel.contains("thinking ..."));
    }

    #[test]
    fn thinking_replaces_earlier_ambient_text() {
        let panel = render_panel(&[], "hint from the last call", "/tmp", 5, true, 10);
        assert!(panel.contains("thinking ..."));
        assert!(!panel.contains("hint from the last call"));
    }

    #[test]
    fn ambient_lines_are_truncated_to_budget() {
        let long = "x".repeat(200);
        let panel = render_panel(&[], &long, "/tmp", 5, false, 10);
        let longest = panel.lines().map(|l| l.chars().count()).max().unwrap();
        assert!(longest <= 65);
    }

    #[test]
    fn ambient_text_capped_at_five_lines() {
        let ambient = (0..9).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let panel = render_panel(&[], &ambient, "/tmp", 5, false, 10);
        assert!(panel.contains("line 4"));
        assert!(!panel.contains("line 5"));
    }

    #[test]
    fn panel_write_is_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("current_hints.txt");
        let panel = render_panel(&[], "hello", "/tmp", 1, false, 10);
        write_panel(&path, &panel).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), panel);
    }
}

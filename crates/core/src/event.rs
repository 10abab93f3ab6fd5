//! Domain events: shell commands seen in the log, rule severities, and the
//! typed entries that make up the shared Context Log.
//!
//! `Severity` and `ContextPayload` are closed enums rather than string tags,
//! so every match over them is checked at compile time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One shell command observed in the external command log.
///
/// Produced by the shell hook, read-only to the daemon. Each line of
/// `cmd_log.jsonl` decodes to one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEvent {
    /// Timestamp when the command was executed.
    pub ts: DateTime<Utc>,

    /// The raw command text as typed.
    pub cmd: String,

    /// Working directory at time of execution.
    #[serde(default)]
    pub cwd: String,
}

impl CommandEvent {
    pub fn new(cmd: impl Into<String>, cwd: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            cmd: cmd.into(),
            cwd: cwd.into(),
        }
    }
}

/// Rule severity, ordered from highest to lowest urgency.
///
/// `Danger` rules are exempt from cooldown suppression: data-loss warnings
/// must surface every time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Danger,
    Warn,
    Tip,
    Upgrade,
}

impl Severity {
    /// Terminal-safe display prefix (no emoji).
    pub fn prefix(&self) -> &'static str {
        match self {
            Severity::Danger => "!! ",
            Severity::Warn => "!  ",
            Severity::Tip => "-> ",
            Severity::Upgrade => "=> ",
        }
    }

    /// Whether this severity bypasses the per-rule cooldown.
    pub fn bypasses_cooldown(&self) -> bool {
        matches!(self, Severity::Danger)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Danger => "danger",
            Severity::Warn => "warn",
            Severity::Tip => "tip",
            Severity::Upgrade => "upgrade",
        };
        f.write_str(s)
    }
}

/// One timestamped record in the shared session log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    pub ts: DateTime<Utc>,

    #[serde(flatten)]
    pub payload: ContextPayload,
}

impl ContextEntry {
    pub fn now(payload: ContextPayload) -> Self {
        Self {
            ts: Utc::now(),
            payload,
        }
    }
}

/// The typed payload of a Context Entry. Arrival order is the session
/// narrative; entries are never mutated after being written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContextPayload {
    /// A command observed in the external log.
    Cmd { cmd: String, cwd: String },

    /// A rule the Reflex Tier surfaced.
    Rule {
        rule_id: String,
        severity: Severity,
        hint: String,
    },

    /// Model-generated ambient hint text.
    Ambient { text: String },

    /// The Advisor Tier's three-part session assessment.
    Advisor {
        intent: String,
        observation: String,
        prediction: String,
    },

    /// An on-demand expert query as received.
    TipQ { query: String },

    /// The expert answer (or explicit unavailability message).
    TipA { answer: String },

    /// A drafted commit message subject.
    PostMortem { subject: String },
}

impl ContextPayload {
    /// Short lowercase tag, matching the wire `kind` field.
    pub fn kind(&self) -> &'static str {
        match self {
            ContextPayload::Cmd { .. } => "cmd",
            ContextPayload::Rule { .. } => "rule",
            ContextPayload::Ambient { .. } => "ambient",
            ContextPayload::Advisor { .. } => "advisor",
            ContextPayload::TipQ { .. } => "tip_q",
            ContextPayload::TipA { .. } => "tip_a",
            ContextPayload::PostMortem { .. } => "post_mortem",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_puts_danger_first() {
        assert!(Severity::Danger < Severity::Warn);
        assert!(Severity::Warn < Severity::Tip);
        assert!(Severity::Tip < Severity::Upgrade);
        assert!(Severity::Danger.bypasses_cooldown());
        assert!(!Severity::Upgrade.bypasses_cooldown());
    }

    #[test]
    fn severity_serde_is_lowercase() {
        let json = serde_json::to_string(&Severity::Danger).unwrap();
        assert_eq!(json, "\"danger\"");
        let back: Severity = serde_json::from_str("\"upgrade\"").unwrap();
        assert_eq!(back, Severity::Upgrade);
    }

    #[test]
    fn context_entry_roundtrip() {
        let entry = ContextEntry::now(ContextPayload::Rule {
            rule_id: "git-001".into(),
            severity: Severity::Warn,
            hint: "git push --force → --force-with-lease".into(),
        });
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"kind\":\"rule\""));
        assert!(json.contains("git-001"));

        let back: ContextEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.payload.kind(), "rule");
    }

    #[test]
    fn command_event_decodes_without_cwd() {
        let back: CommandEvent =
            serde_json::from_str(r#"{"ts":"2025-01-01T00:00:00Z","cmd":"ls -la"}"#).unwrap();
        assert_eq!(back.cmd, "ls -la");
        assert!(back.cwd.is_empty());
    }

    #[test]
    fn payload_kind_tags() {
        let p = ContextPayload::TipQ {
            query: "how do I rebase".into(),
        };
        assert_eq!(p.kind(), "tip_q");
    }
}

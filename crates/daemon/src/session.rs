//! Session state owned exclusively by the orchestrator.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Everything the control loop remembers between iterations. Discarded on
/// shutdown; nothing here needs to survive a restart.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Command-log line count at the last processed poll.
    pub last_cmd_count: usize,

    /// Working directory at the last processed poll.
    pub last_cwd: String,

    /// When the last ambient model call was started.
    pub last_ambient_call: Option<Instant>,

    /// When the advisor last ran, and the command count it saw.
    pub last_advisor_run: Option<Instant>,
    pub advisor_seen_count: usize,

    /// Command count at which the post-mortem generator last fired.
    pub post_mortem_fired_at: usize,

    /// Last surfaced ambient hint text, redisplayed between calls.
    pub last_ambient_text: String,

    /// Per-rule last-shown timestamps for cooldown suppression.
    pub rule_last_shown: HashMap<String, Instant>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// New lines appended to the command log since the last poll.
    pub fn has_new_activity(&self, current_count: usize) -> bool {
        current_count != self.last_cmd_count
    }

    pub fn cwd_changed(&self, cwd: &str) -> bool {
        cwd != self.last_cwd
    }

    /// Whether the ambient throttle window has elapsed.
    pub fn ambient_ready(&self, throttle: Duration) -> bool {
        self.last_ambient_call
            .map(|t| t.elapsed() > throttle)
            .unwrap_or(true)
    }

    /// Advisor gate: new commands since its last run and the inter-call
    /// interval elapsed. The single-flight slot adds the "not already
    /// running" condition.
    pub fn advisor_ready(&self, current_count: usize, interval: Duration) -> bool {
        if current_count <= self.advisor_seen_count {
            return false;
        }
        self.last_advisor_run
            .map(|t| t.elapsed() > interval)
            .unwrap_or(true)
    }

    /// Record which rules the reflex tier just surfaced.
    pub fn mark_shown(&mut self, rule_ids: impl IntoIterator<Item = String>) {
        let now = Instant::now();
        for id in rule_ids {
            self.rule_last_shown.insert(id, now);
        }
    }
}

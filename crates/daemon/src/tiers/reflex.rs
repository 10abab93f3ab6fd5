//! Reflex tier: instant rule-matched hints, no network.

use std::time::Duration;

use shellbuddy_context::ContextLog;
use shellbuddy_core::{CommandEvent, ContextPayload};
use shellbuddy_kb::{RankedHint, RuleDispatcher};
use tracing::warn;

use crate::session::SessionState;

/// Rank hints for the recent window, record them in the cooldown table,
/// and log each surfaced rule so later tiers know what was shown.
pub async fn run(
    dispatcher: &RuleDispatcher,
    log: &ContextLog,
    state: &mut SessionState,
    recent: &[CommandEvent],
    cooldown: Duration,
) -> Vec<RankedHint> {
    let hints = dispatcher.rank_hints(recent, &state.rule_last_shown, cooldown);
    state.mark_shown(hints.iter().map(|h| h.rule_id.clone()));

    for hint in &hints {
        let entry = ContextPayload::Rule {
            rule_id: hint.rule_id.clone(),
            severity: hint.severity,
            hint: hint.text.clone(),
        };
        if let Err(e) = log.append(entry).await {
            warn!(error = %e, "Failed to log rule hint");
        }
    }
    hints
}

//! Deterministic rendering of context entries into prompt text.
//!
//! Every entry kind has a fixed template, so the same tail always produces
//! the same prompt body.

use shellbuddy_core::{ContextEntry, ContextPayload};

/// Render a slice of entries (oldest first) for inclusion in a model prompt.
pub fn render_for_prompt(entries: &[ContextEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let t = entry.ts.format("%H:%M:%S");
        match &entry.payload {
            ContextPayload::Cmd { cmd, .. } => {
                out.push_str(&format!("[{t}] $ {cmd}\n"));
            }
            ContextPayload::Rule {
                rule_id,
                severity,
                hint,
            } => {
                out.push_str(&format!("[{t}] rule {rule_id} ({severity}): {hint}\n"));
            }
            ContextPayload::Ambient { text } => {
                let first = text.lines().next().unwrap_or("");
                out.push_str(&format!("[{t}] hint shown: {first}\n"));
            }
            ContextPayload::Advisor {
                intent,
                observation,
                prediction,
            } => {
                out.push_str(&format!("[{t}] advisor: {intent} / {observation}\n"));
                out.push_str(&format!("  next: {prediction}\n"));
            }
            ContextPayload::TipQ { query } => {
                out.push_str(&format!("[{t}] user asked: {query}\n"));
            }
            ContextPayload::TipA { answer } => {
                let first = answer.lines().next().unwrap_or("");
                out.push_str(&format!("[{t}] answered: {first}\n"));
            }
            ContextPayload::PostMortem { subject } => {
                out.push_str(&format!("[{t}] commit draft: {subject}\n"));
            }
        }
    }
    out
}

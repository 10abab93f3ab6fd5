//! Expert tier: on-demand `/tip` queries.
//!
//! The query arrives as a file; it is consumed on pickup, answered on a
//! background task, and the result is written atomically. This is the
//! only tier that surfaces failure text to the user, because someone is
//! actively waiting on it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use shellbuddy_backends::BackendRouter;
use shellbuddy_context::{render_for_prompt, write_atomic, ContextLog};
use shellbuddy_core::{CommandEvent, ContextPayload};
use shellbuddy_kb::RuleDispatcher;
use tracing::{info, warn};

use crate::prompts;

/// Context Log entries injected into the expert prompt.
const CONTEXT_WINDOW: usize = 20;

/// Matched-rule detail blocks injected into the expert prompt.
const MAX_DETAIL_RULES: usize = 5;

/// Consume a pending query, if one exists. Deletes the trigger file so
/// the same query is never answered twice.
pub fn take_query(query_path: &Path) -> Option<String> {
    let text = std::fs::read_to_string(query_path).ok()?;
    let _ = std::fs::remove_file(query_path);
    let query = text.trim().to_string();
    if query.is_empty() {
        return None;
    }
    Some(query)
}

/// Answer one query on a background task.
///
/// The result target always gets written, either an answer or an explicit
/// bracketed unavailability message. The caller polls the target, so a
/// silent failure would leave them hanging.
pub async fn answer(
    router: Arc<BackendRouter>,
    log: Arc<ContextLog>,
    dispatcher: Arc<RuleDispatcher>,
    backend: String,
    model: String,
    recent: Vec<CommandEvent>,
    query: String,
    result_path: PathBuf,
) {
    info!(query = %query, "Handling /tip query");
    if let Err(e) = log.append(ContextPayload::TipQ { query: query.clone() }).await {
        warn!(error = %e, "Failed to log tip query");
    }

    let result = if !router.is_available(&backend) {
        format!("[{backend} not available, check config.json or start ollama]")
    } else {
        let session = render_for_prompt(&log.read_tail(CONTEXT_WINDOW).await);
        let detail = dispatcher.detail_context(&recent, MAX_DETAIL_RULES);
        let prompt = prompts::tip_prompt(&query, &recent, &session, &detail);
        match router.call(&backend, &prompt, &model).await {
            Some(text) => text,
            None => format!("[{backend}:{model} returned empty, check the daemon log]"),
        }
    };

    if let Err(e) = log.append(ContextPayload::TipA { answer: result.clone() }).await {
        warn!(error = %e, "Failed to log tip answer");
    }
    if let Err(e) = write_atomic(&result_path, &result) {
        warn!(error = %e, "Failed to write tip result");
    } else {
        info!(chars = result.len(), "Tip result written");
    }
}

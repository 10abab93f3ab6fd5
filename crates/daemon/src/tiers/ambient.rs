//! Ambient tier: throttled background hint generation.

use std::sync::Arc;

use shellbuddy_backends::BackendRouter;
use shellbuddy_context::ContextLog;
use shellbuddy_core::{CommandEvent, ContextPayload};
use tracing::warn;

use crate::prompts;

/// One ambient model call. Runs on a background task; the returned text
/// (if any) is picked up by the orchestrator on a later tick.
pub async fn call(
    router: Arc<BackendRouter>,
    log: Arc<ContextLog>,
    backend: String,
    model_chain: Vec<String>,
    recent: Vec<CommandEvent>,
    cwd: String,
) -> Option<String> {
    let prompt = prompts::ambient_prompt(&recent, &cwd);
    let text = router.call_with_chain(&backend, &prompt, &model_chain).await?;

    if let Err(e) = log
        .append(ContextPayload::Ambient { text: text.clone() })
        .await
    {
        warn!(error = %e, "Failed to log ambient hint");
    }
    Some(text)
}

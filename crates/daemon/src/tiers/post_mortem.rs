//! Post-mortem generator: drafts a commit message after a commit lands.

use std::path::PathBuf;
use std::sync::Arc;

use shellbuddy_backends::BackendRouter;
use shellbuddy_context::{render_for_prompt, write_atomic, ContextLog};
use shellbuddy_core::{CommandEvent, ContextPayload};
use tracing::warn;

use crate::prompts;

/// Context Log entries injected into the post-mortem prompt.
const CONTEXT_WINDOW: usize = 30;

/// One draft run on a background task. The raw draft is persisted for
/// later retrieval; only the subject line goes into the Context Log.
pub async fn call(
    router: Arc<BackendRouter>,
    log: Arc<ContextLog>,
    backend: String,
    model: String,
    recent: Vec<CommandEvent>,
    out_path: PathBuf,
) {
    let session = render_for_prompt(&log.read_tail(CONTEXT_WINDOW).await);
    let prompt = prompts::post_mortem_prompt(&recent, &session);

    let Some(draft) = router.call(&backend, &prompt, &model).await else {
        return;
    };
    let subject = draft.lines().next().unwrap_or("").trim().to_string();
    if subject.is_empty() {
        return;
    }

    if let Err(e) = log
        .append(ContextPayload::PostMortem {
            subject: subject.clone(),
        })
        .await
    {
        warn!(error = %e, "Failed to log commit draft");
    }
    if let Err(e) = write_atomic(&out_path, &draft) {
        warn!(error = %e, "Failed to write commit draft");
    }
}

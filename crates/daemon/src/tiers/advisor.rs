//! Advisor tier: a periodic three-line session assessment.

use std::sync::Arc;

use shellbuddy_backends::BackendRouter;
use shellbuddy_context::{render_for_prompt, ContextLog};
use shellbuddy_core::{CommandEvent, ContextPayload};
use tracing::{debug, warn};

use crate::prompts;

/// Context Log entries injected into the advisor prompt.
const CONTEXT_WINDOW: usize = 20;

/// One advisor run on a background task. A failed or short response
/// writes nothing; the gate retries on a later eligible tick.
pub async fn call(
    router: Arc<BackendRouter>,
    log: Arc<ContextLog>,
    backend: String,
    model: String,
    recent: Vec<CommandEvent>,
) {
    let session = render_for_prompt(&log.read_tail(CONTEXT_WINDOW).await);
    let prompt = prompts::advisor_prompt(&recent, &session);

    let Some(text) = router.call(&backend, &prompt, &model).await else {
        return;
    };
    let Some((intent, observation, prediction)) = parse_three_lines(&text) else {
        debug!(lines = text.lines().count(), "Advisor output was not three lines, dropped");
        return;
    };

    let entry = ContextPayload::Advisor {
        intent,
        observation,
        prediction,
    };
    if let Err(e) = log.append(entry).await {
        warn!(error = %e, "Failed to log advisor note");
    }
}

/// Exactly three non-empty lines, in order.
fn parse_three_lines(text: &str) -> Option<(String, String, String)> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    match lines.as_slice() {
        [a, b, c] => Some((a.to_string(), b.to_string(), c.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_clean_lines_parse() {
        let out = parse_three_lines("debugging a test\nrepeating cargo test\nwill edit the test\n");
        let (intent, observation, prediction) = out.unwrap();
        assert_eq!(intent, "debugging a test");
        assert_eq!(observation, "repeating cargo test");
        assert_eq!(prediction, "will edit the test");
    }

    #[test]
    fn blank_lines_are_ignored_in_the_count() {
        assert!(parse_three_lines("a\n\nb\n\nc\n").is_some());
    }

    #[test]
    fn wrong_line_counts_are_rejected() {
        assert!(parse_three_lines("only one line").is_none());
        assert!(parse_three_lines("a\nb\nc\nd").is_none());
        assert!(parse_three_lines("").is_none());
    }

    #[tokio::test]
    async fn failed_call_writes_no_entry() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(ContextLog::open(dir.path().join("ctx.jsonl"), 50));
        let router = Arc::new(BackendRouter::new());

        call(
            router,
            log.clone(),
            "ollama".into(),
            "qwen3:4b".into(),
            vec![CommandEvent::new("ls", "/p")],
        )
        .await;
        assert!(log.is_empty().await);
    }
}

//! `shellbuddy tip`: Ask the expert tier a question.
//!
//! Writes the query trigger file and polls the result target until the
//! daemon answers or the timeout elapses.

use std::time::{Duration, Instant};

use shellbuddy_config::Paths;

pub async fn run(
    paths: Paths,
    query: String,
    timeout_secs: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let query = query.trim().to_string();
    if query.is_empty() {
        return Err("usage: shellbuddy tip \"your question\"".into());
    }
    if !paths.pid_file().exists() {
        return Err("daemon not running, start it with: shellbuddy run".into());
    }

    // stale result from a previous query must not be mistaken for ours
    let _ = std::fs::remove_file(paths.tip_result());
    std::fs::write(paths.tip_query(), &query)?;
    println!("thinking ...");

    let deadline = Instant::now() + Duration::from_secs(timeout_secs);
    loop {
        if let Ok(answer) = std::fs::read_to_string(paths.tip_result()) {
            println!("{}", answer.trim_end());
            return Ok(());
        }
        if Instant::now() >= deadline {
            let _ = std::fs::remove_file(paths.tip_query());
            return Err("timed out waiting for an answer, check the daemon log".into());
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

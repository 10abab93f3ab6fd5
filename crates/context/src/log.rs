//! The Context Log: ring-bounded JSONL with an in-memory mirror of the
//! persisted tail for fast reads.

use std::collections::VecDeque;
use std::path::PathBuf;

use shellbuddy_core::error::ContextError;
use shellbuddy_core::{ContextEntry, ContextPayload};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::atomic::write_atomic;

/// Default ring bound: the most recent N entries are retained.
pub const DEFAULT_MAX_ENTRIES: usize = 200;

/// A mutex-serialized, ring-bounded session log.
///
/// `append` is safe to call from any number of concurrent background tasks;
/// the lock covers both the in-memory ring and the truncate-and-rewrite of
/// the backing file, so interleaved appends can never corrupt it.
pub struct ContextLog {
    path: PathBuf,
    max_entries: usize,
    ring: Mutex<VecDeque<ContextEntry>>,
}

impl ContextLog {
    /// Open the log at `path`, loading any existing tail from disk.
    ///
    /// Malformed lines (a crashed write from an older version, stray text)
    /// are skipped, never fatal.
    pub fn open(path: PathBuf, max_entries: usize) -> Self {
        let mut ring = VecDeque::new();
        if let Ok(content) = std::fs::read_to_string(&path) {
            let mut bad = 0usize;
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                match serde_json::from_str::<ContextEntry>(line) {
                    Ok(entry) => ring.push_back(entry),
                    Err(_) => bad += 1,
                }
            }
            while ring.len() > max_entries {
                ring.pop_front();
            }
            if bad > 0 {
                warn!(skipped = bad, path = %path.display(), "Skipped malformed context entries");
            }
        }
        debug!(path = %path.display(), entries = ring.len(), "Context log opened");
        Self {
            path,
            max_entries,
            ring: Mutex::new(ring),
        }
    }

    /// Append one entry, trim the ring, and persist atomically.
    pub async fn append(&self, payload: ContextPayload) -> Result<(), ContextError> {
        let mut ring = self.ring.lock().await;
        ring.push_back(ContextEntry::now(payload));
        while ring.len() > self.max_entries {
            ring.pop_front();
        }

        let mut content = String::new();
        for entry in ring.iter() {
            let line = serde_json::to_string(entry)
                .map_err(|e| ContextError::Serialization(e.to_string()))?;
            content.push_str(&line);
            content.push('\n');
        }
        write_atomic(&self.path, &content).map_err(|e| ContextError::Storage(e.to_string()))
    }

    /// The last `n` entries, oldest first.
    pub async fn read_tail(&self, n: usize) -> Vec<ContextEntry> {
        let ring = self.ring.lock().await;
        let skip = ring.len().saturating_sub(n);
        ring.iter().skip(skip).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.ring.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellbuddy_core::Severity;
    use std::sync::Arc;

    fn cmd(text: &str) -> ContextPayload {
        ContextPayload::Cmd {
            cmd: text.into(),
            cwd: "/tmp".into(),
        }
    }

    #[tokio::test]
    async fn append_then_read_tail_returns_entry() {
        let dir = tempfile::tempdir().unwrap();
        let log = ContextLog::open(dir.path().join("ctx.jsonl"), 10);
        log.append(cmd("git status")).await.unwrap();

        let tail = log.read_tail(1).await;
        assert_eq!(tail.len(), 1);
        match &tail[0].payload {
            ContextPayload::Cmd { cmd, .. } => assert_eq!(cmd, "git status"),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn ring_bound_holds_after_many_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctx.jsonl");
        let log = ContextLog::open(path.clone(), 5);
        for i in 0..50 {
            log.append(cmd(&format!("echo {i}"))).await.unwrap();
        }
        assert_eq!(log.len().await, 5);

        // persisted tail matches the ring and keeps the newest entries
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 5);
        assert!(content.contains("echo 49"));
        assert!(!content.contains("echo 44\""));
    }

    #[tokio::test]
    async fn concurrent_appends_all_land_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(ContextLog::open(dir.path().join("ctx.jsonl"), 500));

        let mut handles = Vec::new();
        for task in 0..8 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..20 {
                    log.append(cmd(&format!("task{task}-{i}"))).await.unwrap();
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let tail = log.read_tail(500).await;
        assert_eq!(tail.len(), 160);
        let mut texts: Vec<String> = tail
            .iter()
            .map(|e| match &e.payload {
                ContextPayload::Cmd { cmd, .. } => cmd.clone(),
                _ => unreachable!(),
            })
            .collect();
        texts.sort();
        texts.dedup();
        assert_eq!(texts.len(), 160, "an entry was lost or duplicated");
    }

    #[tokio::test]
    async fn reopen_loads_persisted_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctx.jsonl");
        {
            let log = ContextLog::open(path.clone(), 10);
            log.append(ContextPayload::Rule {
                rule_id: "git-001".into(),
                severity: Severity::Warn,
                hint: "h".into(),
            })
            .await
            .unwrap();
        }
        let log = ContextLog::open(path, 10);
        let tail = log.read_tail(10).await;
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].payload.kind(), "rule");
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctx.jsonl");
        let good = serde_json::to_string(&ContextEntry::now(cmd("ok"))).unwrap();
        std::fs::write(&path, format!("{good}\nnot json at all\n{good}x\n{good}\n")).unwrap();

        let log = ContextLog::open(path, 10);
        assert_eq!(log.len().await, 2);
    }

    #[tokio::test]
    async fn read_tail_is_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let log = ContextLog::open(dir.path().join("ctx.jsonl"), 10);
        log.append(cmd("one")).await.unwrap();
        log.append(cmd("two")).await.unwrap();
        log.append(cmd("three")).await.unwrap();

        let tail = log.read_tail(2).await;
        let texts: Vec<&str> = tail
            .iter()
            .map(|e| match &e.payload {
                ContextPayload::Cmd { cmd, .. } => cmd.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(texts, vec!["two", "three"]);
    }
}

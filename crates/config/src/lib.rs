//! Configuration loading and data-directory layout for shellbuddy.
//!
//! Loads `~/.shellbuddy/config.json` (override the directory with the
//! `SHELLBUDDY_DIR` environment variable). Absent keys fall back to
//! built-in defaults; a malformed file is logged and ignored entirely,
//! so the daemon always starts.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-role backend and model routing plus daemon tunables.
///
/// Maps directly to `~/.shellbuddy/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend serving ambient hints (background, throttled).
    pub hint_backend: String,

    /// Model for ambient hints.
    pub hint_model: String,

    /// Optional model fallback chain for ambient hints, tried in order on
    /// the same backend. When empty, only `hint_model` is used.
    pub hint_model_chain: Vec<String>,

    /// Backend serving on-demand `/tip` queries.
    pub tip_backend: String,

    /// Model for `/tip` queries.
    pub tip_model: String,

    /// Backend serving the advisor tier. Defaults to the hint backend.
    pub advisor_backend: String,

    /// Model for the advisor tier.
    pub advisor_model: String,

    /// Backend drafting commit post-mortems. Defaults to the hint backend.
    pub post_mortem_backend: String,

    /// Model for commit post-mortems.
    pub post_mortem_model: String,

    /// Ollama server base URL.
    pub ollama_url: String,

    /// Default model when "claude" is selected without an explicit model.
    pub claude_model: String,

    /// Default model when "copilot" is selected without an explicit model.
    pub copilot_model: String,

    /// Base URL for the OpenAI-compatible backend (OpenAI, Groq, Together, ...).
    pub openai_url: String,

    /// Default model for the OpenAI-compatible backend.
    pub openai_model: String,

    /// Seconds between tip-trigger checks (fast response path).
    pub poll_interval_secs: u64,

    /// Seconds between command-log checks (hint generation path).
    pub hint_interval_secs: u64,

    /// Minimum seconds between ambient model calls.
    pub ai_throttle_secs: u64,

    /// Minimum seconds between advisor runs.
    pub advisor_interval_secs: u64,

    /// How many recent commands to analyse.
    pub window: usize,

    /// Don't hint until this many commands have been seen.
    pub min_commands: usize,

    /// Hint-panel line budget (excluding header + separator).
    pub max_hint_lines: usize,

    /// Seconds before re-showing the same rule hint.
    pub rule_cooldown_secs: u64,

    /// Seconds allowed for an Ollama generate call (cold model load is slow).
    pub ollama_timeout_secs: u64,

    /// Maximum Context Log entries retained (ring bound).
    pub context_max_entries: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hint_backend: "ollama".into(),
            hint_model: "qwen3:4b".into(),
            hint_model_chain: vec![],
            tip_backend: "ollama".into(),
            tip_model: "qwen3:8b".into(),
            advisor_backend: "ollama".into(),
            advisor_model: "qwen3:4b".into(),
            post_mortem_backend: "ollama".into(),
            post_mortem_model: "qwen3:8b".into(),
            ollama_url: "http://localhost:11434".into(),
            claude_model: "claude-haiku-4-5-20251001".into(),
            copilot_model: "gpt-4.1".into(),
            openai_url: "https://api.openai.com/v1".into(),
            openai_model: "gpt-4o-mini".into(),
            poll_interval_secs: 1,
            hint_interval_secs: 5,
            ai_throttle_secs: 25,
            advisor_interval_secs: 45,
            window: 15,
            min_commands: 2,
            max_hint_lines: 10,
            rule_cooldown_secs: 120,
            ollama_timeout_secs: 90,
            context_max_entries: 200,
        }
    }
}

impl AppConfig {
    /// Load configuration from the given data directory.
    ///
    /// Missing file, unreadable file, and malformed JSON all yield the
    /// defaults; configuration problems never stop the daemon.
    pub fn load(paths: &Paths) -> Self {
        Self::load_from(&paths.config_file())
    }

    /// Load from a specific file path with the same degrade-to-defaults
    /// semantics.
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => {
                tracing::info!(path = %path.display(), "No config file, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Malformed config, using defaults");
                Self::default()
            }
        }
    }

    /// Resolve the model chain for the ambient-hint role: the configured
    /// chain if present, otherwise just the single hint model.
    pub fn hint_chain(&self) -> Vec<String> {
        if self.hint_model_chain.is_empty() {
            vec![self.hint_model.clone()]
        } else {
            self.hint_model_chain.clone()
        }
    }
}

/// The `~/.shellbuddy` file layout.
///
/// Every path the daemon reads or writes goes through here, so tests can
/// point the whole tree at a temp directory.
#[derive(Debug, Clone)]
pub struct Paths {
    data_dir: PathBuf,
}

impl Paths {
    /// Resolve from `SHELLBUDDY_DIR`, falling back to `~/.shellbuddy`.
    pub fn resolve() -> Self {
        let dir = std::env::var("SHELLBUDDY_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs_home().join(".shellbuddy"));
        Self { data_dir: dir }
    }

    /// Use an explicit data directory (tests, `--dir` overrides).
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: dir.into(),
        }
    }

    /// Create the data directory if it does not exist.
    pub fn ensure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    /// The external append-only command stream (read-only to the daemon).
    pub fn cmd_log(&self) -> PathBuf {
        self.data_dir.join("cmd_log.jsonl")
    }

    /// The hint panel output target, rewritten each render cycle.
    pub fn hints_out(&self) -> PathBuf {
        self.data_dir.join("current_hints.txt")
    }

    /// On-demand query trigger; consumed (deleted) on pickup.
    pub fn tip_query(&self) -> PathBuf {
        self.data_dir.join("tip_query.txt")
    }

    /// On-demand result target, written atomically.
    pub fn tip_result(&self) -> PathBuf {
        self.data_dir.join("tip_result.txt")
    }

    /// The shared session log.
    pub fn context_log(&self) -> PathBuf {
        self.data_dir.join("context_log.jsonl")
    }

    /// Latest drafted commit message.
    pub fn post_mortem(&self) -> PathBuf {
        self.data_dir.join("post_mortem.txt")
    }

    /// The rule corpus.
    pub fn kb(&self) -> PathBuf {
        self.data_dir.join("kb.json")
    }

    pub fn pid_file(&self) -> PathBuf {
        self.data_dir.join("daemon.pid")
    }

    /// Cached short-lived Copilot API token.
    pub fn copilot_token_cache(&self) -> PathBuf {
        self.data_dir.join("copilot_token.json")
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

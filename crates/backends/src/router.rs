//! Backend router: name-based selection with startup availability probing.
//!
//! Each tier names its backend in config ("ollama", "claude", "copilot",
//! "openai"); the router resolves the name, checks the probed availability
//! set, and degrades every failure to `None` so tiers never crash on a
//! flaky transport.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use shellbuddy_config::{AppConfig, Paths};
use shellbuddy_core::Backend;
use tracing::{debug, info, warn};

use crate::anthropic::AnthropicBackend;
use crate::copilot::CopilotBackend;
use crate::ollama::OllamaBackend;
use crate::openai_compat::OpenAiCompatBackend;

/// Routes completion calls to the correct backend by role name.
pub struct BackendRouter {
    backends: HashMap<String, Arc<dyn Backend>>,
    available: HashSet<String>,
}

impl BackendRouter {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            available: HashSet::new(),
        }
    }

    /// Register a backend under its name.
    pub fn register(&mut self, backend: Arc<dyn Backend>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    /// Probe every registered backend once and record which answered.
    ///
    /// Backends that fail the probe are skipped for the rest of the
    /// session rather than retried on every tick.
    pub async fn probe_all(&mut self) {
        for (name, backend) in &self.backends {
            if backend.probe().await {
                info!(backend = %name, "Backend available");
                self.available.insert(name.clone());
            } else {
                warn!(backend = %name, "Backend unavailable, skipping for this session");
            }
        }
    }

    /// Mark a backend available without probing (tests).
    pub fn mark_available(&mut self, name: &str) {
        self.available.insert(name.to_string());
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.available.contains(name)
    }

    /// Registered backend names, sorted for stable display.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// One completion call, degraded to `None` on any failure.
    pub async fn call(&self, backend: &str, prompt: &str, model: &str) -> Option<String> {
        if !self.available.contains(backend) {
            debug!(backend, "Skipping call, backend not available");
            return None;
        }
        let b = self.backends.get(backend)?;
        match b.complete(prompt, model).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(backend, model, error = %e, "Backend call failed");
                None
            }
        }
    }

    /// Try a model chain in order on one backend, returning the first
    /// successful completion.
    pub async fn call_with_chain(
        &self,
        backend: &str,
        prompt: &str,
        models: &[String],
    ) -> Option<String> {
        for model in models {
            if let Some(text) = self.call(backend, prompt, model).await {
                return Some(text);
            }
        }
        None
    }
}

impl Default for BackendRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the full backend set from configuration.
///
/// API keys come from the environment (`ANTHROPIC_API_KEY`,
/// `OPENAI_API_KEY`, `GITHUB_TOKEN`); a backend with no credentials still
/// registers and simply probes unavailable.
pub fn build_from_config(config: &AppConfig, paths: &Paths) -> BackendRouter {
    let mut router = BackendRouter::new();

    router.register(Arc::new(OllamaBackend::new(
        &config.ollama_url,
        config.ollama_timeout_secs,
    )));
    router.register(Arc::new(AnthropicBackend::new(
        std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
    )));
    router.register(Arc::new(OpenAiCompatBackend::new(
        "openai",
        &config.openai_url,
        std::env::var("OPENAI_API_KEY").unwrap_or_default(),
    )));
    router.register(Arc::new(CopilotBackend::new(paths.copilot_token_cache())));

    router
}

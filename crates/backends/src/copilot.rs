//! GitHub Copilot backend implementation.
//!
//! Copilot's chat API takes a short-lived token obtained by exchanging a
//! GitHub token at `copilot_internal/v2/token`. The exchanged token is
//! cached on disk next to the other shellbuddy state and reused until
//! shortly before expiry; a 401 from the chat endpoint invalidates the
//! cache so the next call re-exchanges.
//!
//! The GitHub token comes from `GITHUB_TOKEN` or `GH_TOKEN`.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shellbuddy_core::error::BackendError;
use shellbuddy_core::Backend;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const TOKEN_EXCHANGE_URL: &str = "https://api.github.com/copilot_internal/v2/token";
const DEFAULT_API_URL: &str = "https://api.individual.githubcopilot.com";
const EDITOR_VERSION: &str = "vscode/1.96.0";
const INTEGRATION_ID: &str = "vscode-chat";

/// GitHub Copilot chat transport.
pub struct CopilotBackend {
    name: String,
    cache_path: PathBuf,
    client: reqwest::Client,
    // serializes token refresh across concurrent tiers
    token: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedToken {
    token: String,
    api_url: String,
    expires_at: i64,
}

impl CachedToken {
    fn is_valid(&self, now: i64) -> bool {
        self.expires_at > now + 60
    }
}

#[derive(Deserialize)]
struct ExchangeResponse {
    token: String,
    #[serde(default)]
    endpoints: serde_json::Value,
    #[serde(default)]
    expires_at: i64,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn github_token() -> Option<String> {
    std::env::var("GITHUB_TOKEN")
        .or_else(|_| std::env::var("GH_TOKEN"))
        .ok()
        .filter(|t| !t.is_empty())
}

/// Pull the chat API base URL out of the exchange response. `endpoints`
/// arrives as either an object or a JSON-encoded string.
fn api_url_from(endpoints: &serde_json::Value) -> String {
    let lookup = |v: &serde_json::Value| {
        v.get("api")
            .and_then(|a| a.as_str())
            .map(|s| s.to_string())
    };
    let url = match endpoints {
        serde_json::Value::Object(_) => lookup(endpoints),
        serde_json::Value::String(s) => serde_json::from_str::<serde_json::Value>(s)
            .ok()
            .and_then(|v| lookup(&v)),
        _ => None,
    };
    url.unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

impl CopilotBackend {
    /// Create a backend that caches its exchanged token at `cache_path`.
    pub fn new(cache_path: PathBuf) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "copilot".into(),
            cache_path,
            client,
            token: Mutex::new(None),
        }
    }

    fn load_cache(&self) -> Option<CachedToken> {
        let content = std::fs::read_to_string(&self.cache_path).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn store_cache(&self, token: &CachedToken) {
        if let Ok(json) = serde_json::to_string(token) {
            if let Err(e) = std::fs::write(&self.cache_path, json) {
                warn!(error = %e, "Failed to write Copilot token cache");
            }
        }
    }

    fn drop_cache(&self) {
        let _ = std::fs::remove_file(&self.cache_path);
    }

    async fn exchange(&self, gh_token: &str) -> Result<CachedToken, BackendError> {
        debug!(backend = "copilot", "Exchanging GitHub token");
        let response = self
            .client
            .get(TOKEN_EXCHANGE_URL)
            .header("Authorization", format!("Bearer {gh_token}"))
            .header("Accept", "application/json")
            .header("editor-version", EDITOR_VERSION)
            .header("Copilot-Integration-Id", INTEGRATION_ID)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(BackendError::AuthenticationFailed(
                "GitHub token rejected for Copilot".into(),
            ));
        }
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::ApiError {
                status_code: status,
                message,
            });
        }

        let resp: ExchangeResponse = response.json().await.map_err(|e| {
            BackendError::ApiError {
                status_code: 200,
                message: format!("Failed to parse token exchange response: {e}"),
            }
        })?;

        Ok(CachedToken {
            api_url: api_url_from(&resp.endpoints),
            token: resp.token,
            expires_at: resp.expires_at,
        })
    }

    /// A valid token: in-memory first, then the disk cache, then a fresh
    /// exchange.
    async fn current_token(&self) -> Result<CachedToken, BackendError> {
        let mut slot = self.token.lock().await;
        let now = unix_now();

        if let Some(cached) = slot.as_ref() {
            if cached.is_valid(now) {
                return Ok(cached.clone());
            }
        }
        if let Some(cached) = self.load_cache() {
            if cached.is_valid(now) {
                *slot = Some(cached.clone());
                return Ok(cached);
            }
        }

        let gh_token = github_token().ok_or_else(|| {
            BackendError::NotAvailable("GITHUB_TOKEN / GH_TOKEN not set".into())
        })?;
        let fresh = self.exchange(&gh_token).await?;
        self.store_cache(&fresh);
        info!(backend = "copilot", "Refreshed Copilot API token");
        *slot = Some(fresh.clone());
        Ok(fresh)
    }
}

#[async_trait]
impl Backend for CopilotBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        prompt: &str,
        model: &str,
    ) -> std::result::Result<String, BackendError> {
        let token = self.current_token().await?;
        let url = format!("{}/chat/completions", token.api_url);
        let body = serde_json::json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": 500,
            "temperature": 0.3,
        });

        debug!(backend = "copilot", model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token.token))
            .header("Content-Type", "application/json")
            .header("Copilot-Integration-Id", INTEGRATION_ID)
            .header("editor-version", EDITOR_VERSION)
            .header("openai-intent", "conversation-panel")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(format!("copilot chat with {model}"))
                } else {
                    BackendError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 401 {
            // stale token, force a re-exchange next call
            self.drop_cache();
            *self.token.lock().await = None;
            return Err(BackendError::AuthenticationFailed(
                "Copilot token expired".into(),
            ));
        }
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            warn!(status, body = %message, "Copilot API error");
            return Err(BackendError::ApiError {
                status_code: status,
                message,
            });
        }

        let api_resp: ChatResponse = response.json().await.map_err(|e| {
            BackendError::ApiError {
                status_code: 200,
                message: format!("Failed to parse Copilot response: {e}"),
            }
        })?;

        let text = api_resp
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(BackendError::EmptyResponse("copilot".into()));
        }
        Ok(text)
    }

    async fn probe(&self) -> bool {
        let now = unix_now();
        if let Some(cached) = self.load_cache() {
            if cached.is_valid(now) {
                return true;
            }
        }
        github_token().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_validity_needs_a_margin() {
        let t = CachedToken {
            token: "x".into(),
            api_url: DEFAULT_API_URL.into(),
            expires_at: 1_000,
        };
        assert!(t.is_valid(900));
        assert!(!t.is_valid(950)); // within the 60 s margin
        assert!(!t.is_valid(1_001));
    }

    #[test]
    fn api_url_from_object_endpoints() {
        let v = serde_json::json!({"api": "https://api.example.githubcopilot.com"});
        assert_eq!(api_url_from(&v), "https://api.example.githubcopilot.com");
    }

    #[test]
    fn api_url_from_string_endpoints() {
        let v = serde_json::json!("{\"api\": \"https://api.example.com\"}");
        assert_eq!(api_url_from(&v), "https://api.example.com");
    }

    #[test]
    fn api_url_falls_back_to_default() {
        assert_eq!(api_url_from(&serde_json::Value::Null), DEFAULT_API_URL);
    }

    #[test]
    fn cache_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let backend = CopilotBackend::new(dir.path().join("copilot_token.json"));
        assert!(backend.load_cache().is_none());

        let t = CachedToken {
            token: "tok".into(),
            api_url: DEFAULT_API_URL.into(),
            expires_at: unix_now() + 3600,
        };
        backend.store_cache(&t);
        let loaded = backend.load_cache().unwrap();
        assert_eq!(loaded.token, "tok");

        backend.drop_cache();
        assert!(backend.load_cache().is_none());
    }
}

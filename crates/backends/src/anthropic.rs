//! Anthropic native backend implementation.
//!
//! Uses the Messages API directly:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - response text in `content[].text` blocks

use async_trait::async_trait;
use serde::Deserialize;
use shellbuddy_core::error::BackendError;
use shellbuddy_core::Backend;
use tracing::{debug, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic Messages API transport.
pub struct AnthropicBackend {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default, rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

impl AnthropicBackend {
    /// Create a backend with the given API key (from config or the
    /// `ANTHROPIC_API_KEY` environment variable).
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "claude".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Custom base URL, for tests and proxies.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Larger models get a larger output budget; the haiku-class models
    /// that serve ambient hints never need more than a few lines.
    fn max_tokens_for(model: &str) -> u32 {
        if model.contains("sonnet") || model.contains("opus") {
            1024
        } else {
            500
        }
    }
}

#[async_trait]
impl Backend for AnthropicBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        prompt: &str,
        model: &str,
    ) -> std::result::Result<String, BackendError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = serde_json::json!({
            "model": model,
            "max_tokens": Self::max_tokens_for(model),
            "messages": [{"role": "user", "content": prompt}],
        });

        debug!(backend = "claude", model, "Sending messages request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(format!("anthropic messages with {model}"))
                } else {
                    BackendError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(BackendError::AuthenticationFailed(
                "Invalid Anthropic API key".into(),
            ));
        }
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            warn!(status, body = %message, "Anthropic API error");
            return Err(BackendError::ApiError {
                status_code: status,
                message,
            });
        }

        let api_resp: MessagesResponse = response.json().await.map_err(|e| {
            BackendError::ApiError {
                status_code: 200,
                message: format!("Failed to parse Anthropic response: {e}"),
            }
        })?;

        let text: String = api_resp
            .content
            .iter()
            .filter(|b| b.block_type == "text")
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("");
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(BackendError::EmptyResponse("claude".into()));
        }
        Ok(text)
    }

    async fn probe(&self) -> bool {
        !self.api_key.is_empty()
    }
}

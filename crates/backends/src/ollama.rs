//! Ollama backend implementation.
//!
//! Uses the native `/api/generate` endpoint with `stream: false`.
//! API docs: <https://github.com/ollama/ollama/blob/main/docs/api.md>
//!
//! Thinking models (qwen3, deepseek-r1) wrap their reasoning in
//! `<think>...</think>`; that block is stripped before the text is
//! returned, since only the final answer belongs in a hint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shellbuddy_core::error::BackendError;
use shellbuddy_core::Backend;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT_SECS: u64 = 90;

/// Local Ollama server transport.
pub struct OllamaBackend {
    name: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

impl GenerateOptions {
    /// Thinking models get headroom for the `<think>` block and no stop
    /// sequence: a blank-line run inside the block would truncate the
    /// reasoning mid-stream and leave nothing after stripping.
    fn for_model(model: &str) -> Self {
        let thinks = model.contains("qwen3") || model.contains("deepseek-r1");
        Self {
            temperature: if thinks { 0.7 } else { 0.3 },
            num_predict: if thinks { 800 } else { 500 },
            stop: if thinks {
                Vec::new()
            } else {
                vec!["\n\n\n".into()]
            },
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaBackend {
    /// Create a backend against the given base URL (e.g.
    /// `http://localhost:11434`).
    ///
    /// The timeout must cover cold model loads, which can take most of a
    /// minute on first call.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let timeout = if timeout_secs == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            timeout_secs
        };
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "ollama".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Names of locally available models, for `status` output.
    pub async fn list_models(&self) -> Vec<String> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(_) => return Vec::new(),
        };
        match resp.json::<TagsResponse>().await {
            Ok(tags) => tags.models.into_iter().map(|m| m.name).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Remove a leading `<think>...</think>` reasoning block.
///
/// An unterminated block (truncated generation) yields an empty string
/// rather than leaking half a chain of thought into the hint panel.
fn strip_thinking(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("<think>") {
        match rest.find("</think>") {
            Some(end) => rest[end + "</think>".len()..].trim().to_string(),
            None => String::new(),
        }
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl Backend for OllamaBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        prompt: &str,
        model: &str,
    ) -> std::result::Result<String, BackendError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions::for_model(model),
        };

        debug!(backend = "ollama", model, "Sending generate request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(format!("ollama generate with {model}"))
                } else if e.is_connect() {
                    BackendError::NotAvailable(
                        "ollama not running, start with: ollama serve".into(),
                    )
                } else {
                    BackendError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            warn!(status, body = %message, "Ollama API error");
            return Err(BackendError::ApiError {
                status_code: status,
                message,
            });
        }

        let api_resp: GenerateResponse = response.json().await.map_err(|e| {
            BackendError::ApiError {
                status_code: 200,
                message: format!("Failed to parse Ollama response: {e}"),
            }
        })?;

        let text = strip_thinking(&api_resp.response);
        if text.is_empty() {
            return Err(BackendError::EmptyResponse("ollama".into()));
        }
        Ok(text)
    }

    async fn probe(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        let probe_client = match reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(3))
            .build()
        {
            Ok(c) => c,
            Err(_) => return false,
        };
        match probe_client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

//! OpenAI-compatible backend implementation.
//!
//! Works with any endpoint that implements the `/chat/completions` spec:
//! OpenAI, Groq, Together, Fireworks, Perplexity, and others. Bearer
//! token authentication.

use async_trait::async_trait;
use serde::Deserialize;
use shellbuddy_core::error::BackendError;
use shellbuddy_core::Backend;
use tracing::{debug, warn};

/// Generic `/chat/completions` transport.
pub struct OpenAiCompatBackend {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
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

impl OpenAiCompatBackend {
    /// Create a backend for the given base URL (e.g.
    /// `https://api.groq.com/openai/v1`).
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }
}

/// Parse the first choice out of a chat-completions response body.
fn first_choice(resp: ChatResponse, backend: &str) -> Result<String, BackendError> {
    let text = resp
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.trim().to_string())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(BackendError::EmptyResponse(backend.to_string()));
    }
    Ok(text)
}

#[async_trait]
impl Backend for OpenAiCompatBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        prompt: &str,
        model: &str,
    ) -> std::result::Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": 500,
            "temperature": 0.3,
        });

        debug!(backend = %self.name, model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(format!("{} chat with {model}", self.name))
                } else {
                    BackendError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(BackendError::AuthenticationFailed(format!(
                "Invalid API key for {}",
                self.name
            )));
        }
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            warn!(backend = %self.name, status, body = %message, "API error");
            return Err(BackendError::ApiError {
                status_code: status,
                message,
            });
        }

        let api_resp: ChatResponse = response.json().await.map_err(|e| {
            BackendError::ApiError {
                status_code: 200,
                message: format!("Failed to parse chat response: {e}"),
            }
        })?;

        first_choice(api_resp, &self.name)
    }

    async fn probe(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_choice_extracts_and_trims() {
        let resp = ChatResponse {
            choices: vec![ChatChoice {
                message: ChatMessage {
                    content: "  use ripgrep instead\n".into(),
                },
            }],
        };
        assert_eq!(first_choice(resp, "openai").unwrap(), "use ripgrep instead");
    }

    #[test]
    fn no_choices_is_an_empty_response() {
        let resp = ChatResponse { choices: vec![] };
        assert!(matches!(
            first_choice(resp, "openai"),
            Err(BackendError::EmptyResponse(_))
        ));
    }

    #[tokio::test]
    async fn probe_requires_an_api_key() {
        let b = OpenAiCompatBackend::new("openai", "https://api.openai.com/v1", "");
        assert!(!b.probe().await);
    }
}

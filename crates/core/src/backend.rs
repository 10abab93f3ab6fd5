//! Backend trait: the abstraction over text-completion transports.
//!
//! A Backend knows how to send one prompt to one service and return the
//! generated text. The daemon's tiers call through the router without
//! knowing which transport is in use, pure polymorphism.
//!
//! Implementations: Ollama, Anthropic, OpenAI-compatible, Copilot.

use async_trait::async_trait;

use crate::error::BackendError;

/// The uniform "prompt in, text or failure out" contract.
///
/// Request and response wire shapes are backend-specific and deliberately
/// not part of this trait.
#[async_trait]
pub trait Backend: Send + Sync {
    /// A short stable name for this backend (e.g., "ollama", "claude").
    fn name(&self) -> &str;

    /// Send a prompt to the given model and return the completion text.
    ///
    /// Implementations carry their own hard timeout; a timed-out or failed
    /// call returns an error, never hangs.
    async fn complete(&self, prompt: &str, model: &str)
    -> std::result::Result<String, BackendError>;

    /// Reachability probe, run once at startup. A backend that probes
    /// unavailable is never called during the session.
    async fn probe(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoBackend;

    #[async_trait]
    impl Backend for EchoBackend {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            prompt: &str,
            _model: &str,
        ) -> std::result::Result<String, BackendError> {
            Ok(prompt.to_string())
        }

        async fn probe(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn trait_object_dispatch() {
        let backend: Box<dyn Backend> = Box::new(EchoBackend);
        assert_eq!(backend.name(), "echo");
        let out = backend.complete("hello", "any").await.unwrap();
        assert_eq!(out, "hello");
        assert!(backend.probe().await);
    }
}

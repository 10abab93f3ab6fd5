//! # shellbuddy Backends
//!
//! Transport implementations of the [`Backend`](shellbuddy_core::Backend)
//! trait, plus the router that selects one per tier role.
//!
//! Backends are pure transports: prompt text in, completion text out.
//! Prompt construction belongs to the tiers, and every backend failure
//! degrades to "no result" at the router boundary.

pub mod anthropic;
pub mod copilot;
pub mod ollama;
pub mod openai_compat;
pub mod router;

pub use anthropic::AnthropicBackend;
pub use copilot::CopilotBackend;
pub use ollama::OllamaBackend;
pub use openai_compat::OpenAiCompatBackend;
pub use router::{build_from_config, BackendRouter};

//! LLM integration
//!
//! Prompt construction and the Ollama HTTP client, with retrying request
//! plumbing shared underneath.

pub mod ollama;
pub mod retry;

pub use ollama::{render_timeline, OllamaClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use retry::RetryPolicy;

//! CrewLine LLM provider infrastructure adapter.
//!
//! Implements the [`pipeline::CompletionProvider`] trait for Groq's
//! OpenAI-compatible chat-completions API. Additional providers are added as
//! new modules in this crate without any changes to the `pipeline` crate.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All HTTP transport, request formatting, response
//! parsing, and exponential back-off live here. The [`pipeline`] crate sees
//! only [`pipeline::CompletionProvider`].

pub mod groq;

pub use groq::{GroqConfig, GroqProvider, DEFAULT_BASE_URL};

/// Errors raised while constructing a provider.
///
/// Per-request failures are reported as [`pipeline::CompletionError`].
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

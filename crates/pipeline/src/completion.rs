//! The completion capability port.
//!
//! Agents obtain text through [`CompletionProvider`]. The trait is defined
//! here; concrete providers (HTTP clients for hosted models) live in the `llm`
//! crate, and tests substitute deterministic stubs.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::{ModelName, RetryPolicy, TokenCount};

/// One request to a completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Model to run.
    pub model: ModelName,
    /// Role of the agent issuing the request. Informational; used for logs.
    pub role: String,
    /// The agent persona, sent as the system prompt.
    pub system: String,
    /// The task context, sent as the user prompt.
    pub prompt: String,
}

impl CompletionRequest {
    /// The persona and task context as a single prompt string, for providers
    /// without a separate system channel.
    pub fn composed(&self) -> String {
        format!("{}\n\n{}", self.system, self.prompt)
    }
}

/// A provider's answer to a [`CompletionRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Generated text.
    pub text: String,
    /// Tokens consumed by the call, when the provider reports it.
    pub usage: TokenCount,
}

impl Completion {
    /// A completion with no reported usage.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: TokenCount::default(),
        }
    }
}

/// Failures reported by a completion provider.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    /// The provider is missing credentials or other required configuration.
    #[error("completion provider not configured: {message}")]
    NotConfigured {
        /// What is missing.
        message: String,
    },

    /// The request could not be delivered or timed out.
    #[error("transport error: {message}")]
    Transport {
        /// Underlying transport error text.
        message: String,
    },

    /// The provider rejected the request with an HTTP status.
    #[error("provider returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (possibly truncated).
        body: String,
        /// Server-requested delay before retrying, if any.
        retry_after: Option<Duration>,
    },

    /// The provider answered but the response could not be interpreted.
    #[error("invalid provider response: {message}")]
    InvalidResponse {
        /// Description of the problem.
        message: String,
    },

    /// Any other provider-side failure.
    #[error("{message}")]
    Provider {
        /// Provider error text.
        message: String,
    },
}

impl CompletionError {
    /// Whether re-issuing the same request may succeed.
    ///
    /// Transport failures, `408`, `429` and `5xx` responses are retryable;
    /// everything else is not.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Transport { .. } => RetryPolicy::Retryable { after: None },
            Self::Status {
                status,
                retry_after,
                ..
            } if *status == 408 || *status == 429 || *status >= 500 => RetryPolicy::Retryable {
                after: *retry_after,
            },
            _ => RetryPolicy::NonRetryable,
        }
    }
}

/// A source of text completions.
///
/// Implementations must be shareable across concurrent runs; they are held
/// behind `Arc<dyn CompletionProvider>`. Any retry policy belongs to the
/// implementation, not to its callers.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generates a completion for `request`.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError>;
}

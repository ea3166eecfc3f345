//! Deterministic completion provider for tests (testing only).
//!
//! [`EchoProvider`] answers every request with `"<role>: <prompt>"`, records
//! each request it receives, and can be told to fail for one agent role.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::{Completion, CompletionError, CompletionProvider, CompletionRequest, TokenCount};

/// Echoing [`CompletionProvider`] that records its calls.
#[derive(Debug, Default)]
pub struct EchoProvider {
    failing_role: Option<(String, String)>,
    usage_per_call: TokenCount,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl EchoProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every request from the agent with `role`, with `message`.
    pub fn failing_for(role: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            failing_role: Some((role.into(), message.into())),
            ..Self::default()
        }
    }

    /// Reports `usage` tokens for every successful call.
    pub fn with_usage(mut self, usage: TokenCount) -> Self {
        self.usage_per_call = usage;
        self
    }

    /// Number of requests received, including failed ones.
    pub fn calls(&self) -> usize {
        self.lock().len()
    }

    /// Copies of every request received, in arrival order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CompletionRequest>> {
        self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CompletionProvider for EchoProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError> {
        self.lock().push(request.clone());

        if let Some((role, message)) = &self.failing_role {
            if *role == request.role {
                return Err(CompletionError::Provider {
                    message: message.clone(),
                });
            }
        }

        Ok(Completion {
            text: format!("{}: {}", request.role, request.prompt),
            usage: self.usage_per_call,
        })
    }
}

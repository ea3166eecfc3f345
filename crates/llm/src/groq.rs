//! Groq chat-completions client (OpenAI-compatible wire format).

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{
    Completion, CompletionError, CompletionProvider, CompletionRequest, RetryPolicy, TokenCount,
};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::LlmError;

/// Default endpoint base for Groq's OpenAI-compatible API.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

const MAX_ERROR_BODY: usize = 2_000;
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Connection and retry settings for [`GroqProvider`].
#[derive(Debug, Clone)]
pub struct GroqConfig {
    /// Bearer token. `None` makes every call fail with
    /// [`CompletionError::NotConfigured`].
    pub api_key: Option<String>,
    /// API base, without the trailing `/chat/completions`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt for retryable failures.
    pub max_retries: u32,
    /// First back-off delay; doubles on every further retry.
    pub initial_backoff: Duration,
    pub temperature: f32,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            temperature: 0.7,
        }
    }
}

/// [`CompletionProvider`] backed by Groq's hosted models.
#[derive(Debug, Clone)]
pub struct GroqProvider {
    client: reqwest::Client,
    endpoint: String,
    config: GroqConfig,
}

impl GroqProvider {
    pub fn new(config: GroqConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    /// Returns `true` when an API key is present.
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn send_once(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<Completion, CompletionError> {
        let body = ChatRequest {
            model: wire_model(request.model.as_str()),
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after(response.headers());
            let mut text = response.text().await.unwrap_or_default();
            truncate(&mut text, MAX_ERROR_BODY);
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: text,
                retry_after,
            });
        }

        let text = response.text().await.map_err(transport)?;
        parse_response(&text)
    }
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    #[instrument(skip_all, fields(model = %request.model, role = %request.role))]
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| CompletionError::NotConfigured {
                message: "GROQ_API_KEY is not set".to_string(),
            })?;

        let mut attempt = 0;
        loop {
            match self.send_once(api_key, request).await {
                Ok(completion) => {
                    debug!(attempt, tokens = completion.usage.as_u64(), "completion received");
                    return Ok(completion);
                }
                Err(err) => match err.retry_policy() {
                    RetryPolicy::Retryable { after } if attempt < self.config.max_retries => {
                        let delay = after
                            .unwrap_or_else(|| backoff(self.config.initial_backoff, attempt))
                            .min(MAX_BACKOFF);
                        warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying completion");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    _ => return Err(err),
                },
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

/// Extracts the first choice's text and the reported token usage.
pub(crate) fn parse_response(body: &str) -> Result<Completion, CompletionError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::InvalidResponse {
            message: format!("malformed JSON: {e}"),
        })?;

    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| CompletionError::InvalidResponse {
            message: "response contained no message content".to_string(),
        })?;

    Ok(Completion {
        text,
        usage: TokenCount::new(parsed.usage.map(|u| u.total_tokens).unwrap_or_default()),
    })
}

/// Model names may carry a `groq/` routing prefix; the API wants the bare name.
fn wire_model(model: &str) -> &str {
    model.strip_prefix("groq/").unwrap_or(model)
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| Duration::from_secs_f64(secs.min(MAX_BACKOFF.as_secs_f64())))
}

fn backoff(initial: Duration, attempt: u32) -> Duration {
    initial.saturating_mul(2u32.saturating_pow(attempt))
}

fn transport(err: reqwest::Error) -> CompletionError {
    CompletionError::Transport {
        message: err.to_string(),
    }
}

fn truncate(text: &mut String, max: usize) {
    if text.len() > max {
        let mut cut = max;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
}

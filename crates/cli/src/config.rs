//! Environment-driven configuration.
//!
//! Read after `.env` has been loaded, so values from the file and the real
//! environment are indistinguishable here. `PORT` and `CREW_MODE` are handled
//! by the argument parser; everything else lives in [`Config`].

use std::time::Duration;

use llm::{GroqConfig, DEFAULT_BASE_URL};
use nodes::{CrewKind, CrewModels};
use pipeline::ModelName;

const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const DEFAULT_MAX_RETRIES: u32 = 2;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must not be blank")]
    Blank { key: &'static str },
}

/// Process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    /// Overrides the per-crew default model when set.
    pub model: Option<String>,
    pub base_url: String,
    pub environment: String,
    pub run_timeout: Duration,
    pub max_retries: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let run_timeout = match get("CREW_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("CREW_TIMEOUT_SECS", raw)?),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
        let max_retries = match get("LLM_MAX_RETRIES") {
            Some(raw) => parse_number("LLM_MAX_RETRIES", raw)?,
            None => DEFAULT_MAX_RETRIES,
        };

        Ok(Self {
            api_key: get("GROQ_API_KEY"),
            model: get("GROQ_MODEL_NAME"),
            base_url: get("GROQ_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            environment: get("NODE_ENV").unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            run_timeout,
            max_retries,
        })
    }

    /// Model for `kind`: the override if configured, else the crew's default.
    pub fn model_for(&self, kind: CrewKind) -> Result<ModelName, ConfigError> {
        let name = self.model.as_deref().unwrap_or(kind.default_model());
        ModelName::new(name).ok_or(ConfigError::Blank {
            key: "GROQ_MODEL_NAME",
        })
    }

    pub fn models(&self) -> Result<CrewModels, ConfigError> {
        Ok(CrewModels {
            content_marketing: self.model_for(CrewKind::ContentMarketing)?,
            analyst: self.model_for(CrewKind::Analyst)?,
        })
    }

    pub fn groq(&self) -> GroqConfig {
        GroqConfig {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            max_retries: self.max_retries,
            ..GroqConfig::default()
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::InvalidNumber { key, value: raw })
}

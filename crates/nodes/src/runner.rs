//! The run façade: one topic in, one [`ResultEnvelope`] out.
//!
//! [`CrewRunner`] is the only place in the workspace that turns a
//! [`pipeline::CrewError`] into data. Everything below it propagates; everything above it
//! (HTTP handlers, the CLI) receives an envelope and never sees an error.
//!
//! Each call builds fresh agents, tasks and a fresh [`Crew`]. The only state
//! shared between concurrent runs is the provider handle, which is immutable.

use std::sync::Arc;

use pipeline::{
    CompletionProvider, CrewResult, LlmBinding, ModelName, Parameters, ResultEnvelope,
};
use tracing::{error, info, instrument};

use crate::crew::{Crew, CrewOptions, CrewOutput};
use crate::crews::CrewKind;

/// Models to use per crew kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrewModels {
    pub content_marketing: ModelName,
    pub analyst: ModelName,
}

impl CrewModels {
    /// Uses `model` for every crew kind.
    pub fn uniform(model: ModelName) -> Self {
        Self {
            content_marketing: model.clone(),
            analyst: model,
        }
    }

    pub fn for_kind(&self, kind: CrewKind) -> &ModelName {
        match kind {
            CrewKind::ContentMarketing => &self.content_marketing,
            CrewKind::Analyst => &self.analyst,
        }
    }
}

/// Builds and runs built-in crews against a shared completion provider.
#[derive(Clone)]
pub struct CrewRunner {
    provider: Arc<dyn CompletionProvider>,
    models: CrewModels,
    default_kind: CrewKind,
    options: CrewOptions,
}

impl CrewRunner {
    pub fn new(provider: Arc<dyn CompletionProvider>, models: CrewModels, options: CrewOptions) -> Self {
        Self {
            provider,
            models,
            default_kind: CrewKind::default(),
            options,
        }
    }

    /// Sets the crew [`CrewRunner::run`] uses.
    pub fn with_default_kind(mut self, kind: CrewKind) -> Self {
        self.default_kind = kind;
        self
    }

    pub fn default_kind(&self) -> CrewKind {
        self.default_kind
    }

    pub fn models(&self) -> &CrewModels {
        &self.models
    }

    /// Runs the default crew on `topic`.
    pub async fn run(&self, topic: &str) -> ResultEnvelope {
        self.run_kind(topic, self.default_kind).await
    }

    /// Runs `kind` on `topic`, converting any failure into a failure envelope.
    #[instrument(skip(self), fields(crew = %kind))]
    pub async fn run_kind(&self, topic: &str, kind: CrewKind) -> ResultEnvelope {
        match self.kickoff(topic, kind).await {
            Ok(output) => {
                info!(run_id = %output.run_id, usage = %output.usage, "crew run succeeded");
                ResultEnvelope::success(topic, output.final_output).with_mode(kind.mode_name())
            }
            Err(err) => {
                error!(error = %err, "crew run failed");
                ResultEnvelope::failure(topic, err.to_string()).with_mode(kind.mode_name())
            }
        }
    }

    /// Runs `kind` on `topic` and returns the full output or the error.
    pub async fn kickoff(&self, topic: &str, kind: CrewKind) -> CrewResult<CrewOutput> {
        let llm = LlmBinding::new(self.provider.clone(), self.models.for_kind(kind).clone());
        let (agents, tasks) = kind.build(&llm)?;
        let mut crew = Crew::new(agents, tasks, self.options)?;
        crew.kickoff(&Parameters::new().with("topic", topic)).await
    }
}

impl std::fmt::Debug for CrewRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrewRunner")
            .field("models", &self.models)
            .field("default_kind", &self.default_kind)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

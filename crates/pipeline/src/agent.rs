//! Agents: a role with a persona, bound to a completion capability.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    AgentId, Completion, CompletionProvider, CompletionRequest, CrewError, CrewResult, ModelName,
    Parameters, Template,
};

/// The completion capability an agent speaks through: a shared provider plus
/// the model it should run.
#[derive(Clone)]
pub struct LlmBinding {
    provider: Arc<dyn CompletionProvider>,
    model: ModelName,
}

impl LlmBinding {
    /// Binds `provider` to `model`.
    pub fn new(provider: Arc<dyn CompletionProvider>, model: ModelName) -> Self {
        Self { provider, model }
    }

    /// The model requests are issued against.
    pub fn model(&self) -> &ModelName {
        &self.model
    }
}

impl std::fmt::Debug for LlmBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmBinding")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// A named role with a goal and backstory.
///
/// The goal and backstory are templates resolved against the run parameters.
/// An agent is immutable once built; the same persona text is therefore
/// prepended to every request it issues during a run.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    role: String,
    goal: Template,
    backstory: Template,
    allow_delegation: bool,
    llm: LlmBinding,
}

impl Agent {
    /// Creates an agent that does not delegate.
    pub fn new(
        id: AgentId,
        role: impl Into<String>,
        goal: impl Into<Template>,
        backstory: impl Into<Template>,
        llm: LlmBinding,
    ) -> Self {
        Self {
            id,
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            allow_delegation: false,
            llm,
        }
    }

    /// Sets whether this agent may hand work to other agents.
    ///
    /// Crews run strictly sequentially and never delegate, so the flag is only
    /// reported; it does not change execution.
    pub fn with_delegation(mut self, allowed: bool) -> Self {
        self.allow_delegation = allowed;
        self
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn goal(&self) -> &Template {
        &self.goal
    }

    pub fn backstory(&self) -> &Template {
        &self.backstory
    }

    pub fn allows_delegation(&self) -> bool {
        self.allow_delegation
    }

    pub fn model(&self) -> &ModelName {
        self.llm.model()
    }

    /// The agent's templates, labelled for diagnostics.
    pub fn templates(&self) -> [(&'static str, &Template); 2] {
        [("goal", &self.goal), ("backstory", &self.backstory)]
    }

    /// Renders the persona prepended to every request from this agent.
    pub fn persona(&self, params: &Parameters) -> CrewResult<String> {
        let goal = self.resolve("goal", &self.goal, params)?;
        let backstory = self.resolve("backstory", &self.backstory, params)?;
        Ok(format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, backstory, goal
        ))
    }

    /// Sends `context` to the completion capability under this agent's persona.
    ///
    /// Issues exactly one provider call. Provider errors are returned as
    /// [`CrewError::CompletionFailure`] carrying this agent's role.
    #[instrument(skip_all, fields(role = %self.role, model = %self.llm.model))]
    pub async fn respond(&self, context: &str, params: &Parameters) -> CrewResult<Completion> {
        let request = CompletionRequest {
            model: self.llm.model.clone(),
            role: self.role.clone(),
            system: self.persona(params)?,
            prompt: context.to_string(),
        };

        let completion = self
            .llm
            .provider
            .complete(&request)
            .await
            .map_err(|source| CrewError::CompletionFailure {
                role: self.role.clone(),
                source,
            })?;

        debug!(
            chars = completion.text.len(),
            tokens = completion.usage.as_u64(),
            "agent responded"
        );
        Ok(completion)
    }

    fn resolve(&self, field: &str, template: &Template, params: &Parameters) -> CrewResult<String> {
        template
            .resolve(params)
            .map_err(|missing| CrewError::MissingParameter {
                name: missing.name,
                location: format!("agent '{}' {}", self.role, field),
            })
    }
}

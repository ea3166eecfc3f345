//! Tasks: one pipeline stage and the prompt it sends to its agent.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{Agent, AgentId, CrewError, CrewResult, Parameters, TaskId, Template, Timestamp, TokenCount};

/// A unit of work assigned to exactly one agent.
///
/// Tasks are immutable records: the agent is referenced by [`AgentId`] and
/// upstream dependencies by [`TaskId`]. Their validity is checked when a
/// [`crate::Topology`] is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    description: Template,
    expected_output: Template,
    agent: AgentId,
    upstream: Vec<TaskId>,
}

impl Task {
    /// Creates a task with no upstream dependencies.
    pub fn new(
        id: TaskId,
        description: impl Into<Template>,
        expected_output: impl Into<Template>,
        agent: AgentId,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            expected_output: expected_output.into(),
            agent,
            upstream: Vec::new(),
        }
    }

    /// Adds upstream tasks whose outputs are appended to this task's context,
    /// in the given order.
    pub fn with_upstream(mut self, tasks: impl IntoIterator<Item = TaskId>) -> Self {
        self.upstream.extend(tasks);
        self
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn description(&self) -> &Template {
        &self.description
    }

    pub fn expected_output(&self) -> &Template {
        &self.expected_output
    }

    pub fn agent(&self) -> &AgentId {
        &self.agent
    }

    pub fn upstream(&self) -> &[TaskId] {
        &self.upstream
    }

    /// The task's templates, labelled for diagnostics.
    pub fn templates(&self) -> [(&'static str, &Template); 2] {
        [
            ("description", &self.description),
            ("expected output", &self.expected_output),
        ]
    }

    /// Builds the prompt context sent to the assigned agent.
    ///
    /// `upstream` must hold the outputs of [`Task::upstream`], in that order.
    pub fn prompt(&self, params: &Parameters, upstream: &[&TaskOutput]) -> CrewResult<String> {
        let description = self.resolve("description", &self.description, params)?;
        let expected = self.resolve("expected output", &self.expected_output, params)?;
        Ok(compose_prompt(&description, &expected, upstream))
    }

    /// Runs the task: resolves its templates, builds the context and asks
    /// `agent` to respond.
    #[instrument(skip_all, fields(task = %self.id, agent = %agent.role()))]
    pub async fn execute(
        &self,
        agent: &Agent,
        upstream: &[&TaskOutput],
        params: &Parameters,
    ) -> CrewResult<TaskOutput> {
        let prompt = self.prompt(params, upstream)?;
        debug!(upstream = upstream.len(), chars = prompt.len(), "task prompt built");

        let completion = agent.respond(&prompt, params).await?;
        Ok(TaskOutput {
            task: self.id.clone(),
            agent_role: agent.role().to_string(),
            prompt,
            text: completion.text,
            usage: completion.usage,
            completed_at: Timestamp::now(),
        })
    }

    fn resolve(&self, field: &str, template: &Template, params: &Parameters) -> CrewResult<String> {
        template
            .resolve(params)
            .map_err(|missing| CrewError::MissingParameter {
                name: missing.name,
                location: format!("task '{}' {}", self.id, field),
            })
    }
}

/// Formats the prompt context for a task.
///
/// ```text
/// <description>
///
/// Expected output: <expected output>
///
///
/// Context from upstream tasks:
///
/// --- output of task '<id>' ---
/// <output>
/// ```
///
/// The context section is omitted when there are no upstream outputs.
pub fn compose_prompt(description: &str, expected_output: &str, upstream: &[&TaskOutput]) -> String {
    let mut prompt = format!("{description}\n\nExpected output: {expected_output}");
    if !upstream.is_empty() {
        prompt.push_str("\n\n\nContext from upstream tasks:");
        for output in upstream {
            prompt.push_str(&format!(
                "\n\n--- output of task '{}' ---\n{}",
                output.task, output.text
            ));
        }
    }
    prompt
}

/// The recorded result of a completed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Task that produced this output.
    pub task: TaskId,
    /// Role of the agent that answered.
    pub agent_role: String,
    /// Prompt context the agent was given.
    pub prompt: String,
    /// Text returned by the agent.
    pub text: String,
    /// Tokens the completion consumed.
    pub usage: TokenCount,
    /// When the output was recorded.
    pub completed_at: Timestamp,
}

/// Execution state of a task within one crew run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Not started.
    Pending,
    /// Waiting for its agent.
    Running,
    /// Finished; the output never changes afterwards.
    Completed(TaskOutput),
    /// Failed with the given error message.
    Failed(String),
}

impl TaskState {
    /// The recorded output, if the task completed.
    pub fn output(&self) -> Option<&TaskOutput> {
        match self {
            Self::Completed(output) => Some(output),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(task: &str, text: &str) -> TaskOutput {
        TaskOutput {
            task: TaskId::new(task).unwrap(),
            agent_role: "Someone".into(),
            prompt: String::new(),
            text: text.into(),
            usage: TokenCount::default(),
            completed_at: Timestamp::now(),
        }
    }

    fn write_task() -> Task {
        Task::new(
            TaskId::new("write").unwrap(),
            "Write a memo on {topic}.",
            "A memo about {topic}.",
            AgentId::new("writer").unwrap(),
        )
    }

    #[test]
    fn prompt_without_upstream_has_no_context_section() {
        let prompt = write_task()
            .prompt(&Parameters::new().with("topic", "AI"), &[])
            .unwrap();
        assert_eq!(prompt, "Write a memo on AI.\n\nExpected output: A memo about AI.");
    }

    #[test]
    fn upstream_outputs_appear_verbatim_and_in_order() {
        let research = output("research", "facts\nwith lines");
        let plan = output("plan", "outline");
        let prompt = write_task()
            .prompt(&Parameters::new().with("topic", "AI"), &[&research, &plan])
            .unwrap();

        assert_eq!(
            prompt,
            "Write a memo on AI.\n\nExpected output: A memo about AI.\n\n\n\
             Context from upstream tasks:\n\n\
             --- output of task 'research' ---\nfacts\nwith lines\n\n\
             --- output of task 'plan' ---\noutline"
        );
        let first = prompt.find("facts\nwith lines").unwrap();
        let second = prompt.find("outline").unwrap();
        assert!(first < second);
    }

    #[test]
    fn missing_parameter_names_the_task_field() {
        let err = write_task().prompt(&Parameters::new(), &[]).unwrap_err();
        match err {
            CrewError::MissingParameter { name, location } => {
                assert_eq!(name, "topic");
                assert_eq!(location, "task 'write' description");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn state_exposes_output_only_when_completed() {
        assert!(TaskState::Pending.output().is_none());
        assert!(TaskState::Failed("boom".into()).output().is_none());
        let done = TaskState::Completed(output("plan", "outline"));
        assert_eq!(done.output().map(|o| o.text.as_str()), Some("outline"));
    }
}

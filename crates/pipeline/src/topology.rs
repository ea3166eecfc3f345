//! Validated crew topology: ordered agents and tasks with resolved references.
//!
//! A [`Topology`] is the explicit DAG a crew executes. Construction checks
//! every structural invariant once so the orchestrator can index agents and
//! upstream outputs without further lookups:
//!
//! - at least one agent and one task;
//! - agent and task identifiers are unique;
//! - every task's agent is registered;
//! - every upstream reference names a task declared *earlier*, at most once.
//!
//! The last rule makes the graph acyclic by construction and keeps
//! declaration order a valid execution order.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::{Agent, CrewError, CrewResult, Parameters, Task};

/// Where a placeholder is used, for eager parameter checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterUse {
    /// Placeholder name.
    pub name: String,
    /// Human-readable location (e.g. `"task 'plan' description"`).
    pub location: String,
}

/// Agents and tasks in declaration order, with validated references.
#[derive(Debug, Clone)]
pub struct Topology {
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    assignments: Vec<usize>,
    upstream: Vec<Vec<usize>>,
}

impl Topology {
    /// Validates and indexes `agents` and `tasks`.
    pub fn new(agents: Vec<Agent>, tasks: Vec<Task>) -> CrewResult<Self> {
        if agents.is_empty() {
            return Err(CrewError::topology("a crew needs at least one agent"));
        }
        if tasks.is_empty() {
            return Err(CrewError::topology("a crew needs at least one task"));
        }

        let mut agent_index = HashMap::with_capacity(agents.len());
        for (i, agent) in agents.iter().enumerate() {
            if agent_index.insert(agent.id(), i).is_some() {
                return Err(CrewError::topology(format!(
                    "agent '{}' is declared more than once",
                    agent.id()
                )));
            }
        }

        let mut task_index = HashMap::with_capacity(tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            if task_index.insert(task.id(), i).is_some() {
                return Err(CrewError::topology(format!(
                    "task '{}' is declared more than once",
                    task.id()
                )));
            }
        }

        let mut assignments = Vec::with_capacity(tasks.len());
        let mut upstream = Vec::with_capacity(tasks.len());
        for (position, task) in tasks.iter().enumerate() {
            let agent = agent_index.get(task.agent()).copied().ok_or_else(|| {
                CrewError::topology(format!(
                    "task '{}' is assigned to unknown agent '{}'",
                    task.id(),
                    task.agent()
                ))
            })?;
            assignments.push(agent);

            let mut seen = HashSet::new();
            let mut indices = Vec::with_capacity(task.upstream().len());
            for dep in task.upstream() {
                let index = task_index.get(dep).copied().ok_or_else(|| {
                    CrewError::topology(format!(
                        "task '{}' depends on unknown task '{}'",
                        task.id(),
                        dep
                    ))
                })?;
                if index == position {
                    return Err(CrewError::topology(format!(
                        "task '{}' depends on itself",
                        task.id()
                    )));
                }
                if index > position {
                    return Err(CrewError::topology(format!(
                        "task '{}' depends on '{}', which is declared after it",
                        task.id(),
                        dep
                    )));
                }
                if !seen.insert(index) {
                    return Err(CrewError::topology(format!(
                        "task '{}' lists upstream task '{}' more than once",
                        task.id(),
                        dep
                    )));
                }
                indices.push(index);
            }
            upstream.push(indices);
        }

        Ok(Self {
            agents,
            tasks,
            assignments,
            upstream,
        })
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Always `false`: a topology holds at least one task.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The agent assigned to the task at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn agent_for(&self, index: usize) -> &Agent {
        &self.agents[self.assignments[index]]
    }

    /// Indices of the upstream tasks of the task at `index`, in declared order.
    /// Every index is smaller than `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn upstream_of(&self, index: usize) -> &[usize] {
        &self.upstream[index]
    }

    /// Every placeholder referenced by an agent or task, in declaration order.
    pub fn parameter_uses(&self) -> Vec<ParameterUse> {
        let agent_uses = self.agents.iter().flat_map(|agent| {
            agent.templates().into_iter().flat_map(move |(field, template)| {
                template.placeholders().map(move |name| ParameterUse {
                    name: name.to_string(),
                    location: format!("agent '{}' {}", agent.role(), field),
                })
            })
        });
        let task_uses = self.tasks.iter().flat_map(|task| {
            task.templates().into_iter().flat_map(move |(field, template)| {
                template.placeholders().map(move |name| ParameterUse {
                    name: name.to_string(),
                    location: format!("task '{}' {}", task.id(), field),
                })
            })
        });
        agent_uses.chain(task_uses).collect()
    }

    /// Distinct parameter names the topology needs.
    pub fn required_parameters(&self) -> BTreeSet<String> {
        self.parameter_uses().into_iter().map(|u| u.name).collect()
    }

    /// Fails with [`CrewError::MissingParameter`] for the first placeholder
    /// (in declaration order) that `params` does not supply.
    pub fn check_parameters(&self, params: &Parameters) -> CrewResult<()> {
        match self
            .parameter_uses()
            .into_iter()
            .find(|u| !params.contains(&u.name))
        {
            Some(ParameterUse { name, location }) => {
                Err(CrewError::MissingParameter { name, location })
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        AgentId, Completion, CompletionError, CompletionProvider, CompletionRequest, LlmBinding,
        ModelName, TaskId,
    };

    struct Silent;

    #[async_trait]
    impl CompletionProvider for Silent {
        async fn complete(&self, _: &CompletionRequest) -> Result<Completion, CompletionError> {
            Ok(Completion::text(""))
        }
    }

    fn agent(id: &str) -> Agent {
        Agent::new(
            AgentId::new(id).unwrap(),
            id.to_uppercase(),
            "Goal on {topic}",
            "Backstory",
            LlmBinding::new(Arc::new(Silent), ModelName::new("m").unwrap()),
        )
    }

    fn task(id: &str, agent: &str, upstream: &[&str]) -> Task {
        Task::new(
            TaskId::new(id).unwrap(),
            format!("Do {id} for {{topic}}"),
            "Something for {audience}",
            AgentId::new(agent).unwrap(),
        )
        .with_upstream(upstream.iter().map(|u| TaskId::new(*u).unwrap()))
    }

    fn reason(result: CrewResult<Topology>) -> String {
        match result {
            Err(CrewError::InvalidTopology { reason }) => reason,
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("topology unexpectedly valid"),
        }
    }

    #[test]
    fn resolves_assignments_and_upstream_indices() {
        let topology = Topology::new(
            vec![agent("planner"), agent("writer")],
            vec![
                task("plan", "planner", &[]),
                task("draft", "writer", &["plan"]),
                task("polish", "writer", &["plan", "draft"]),
            ],
        )
        .unwrap();

        assert_eq!(topology.len(), 3);
        assert_eq!(topology.agent_for(1).id().as_str(), "writer");
        assert_eq!(topology.upstream_of(0), &[] as &[usize]);
        assert_eq!(topology.upstream_of(2), &[0, 1]);
    }

    #[test]
    fn rejects_forward_and_self_references() {
        let forward = reason(Topology::new(
            vec![agent("a")],
            vec![task("one", "a", &["two"]), task("two", "a", &[])],
        ));
        assert!(forward.contains("declared after it"), "{forward}");

        let cyclic = reason(Topology::new(vec![agent("a")], vec![task("one", "a", &["one"])]));
        assert!(cyclic.contains("depends on itself"), "{cyclic}");
    }

    #[test]
    fn rejects_unknown_references_and_duplicates() {
        let unknown_agent = reason(Topology::new(vec![agent("a")], vec![task("one", "b", &[])]));
        assert!(unknown_agent.contains("unknown agent 'b'"));

        let unknown_task = reason(Topology::new(vec![agent("a")], vec![task("one", "a", &["zero"])]));
        assert!(unknown_task.contains("unknown task 'zero'"));

        let duplicate_task = reason(Topology::new(
            vec![agent("a")],
            vec![task("one", "a", &[]), task("one", "a", &[])],
        ));
        assert!(duplicate_task.contains("declared more than once"));

        let duplicate_agent = reason(Topology::new(vec![agent("a"), agent("a")], vec![task("one", "a", &[])]));
        assert!(duplicate_agent.contains("agent 'a'"));

        let repeated_upstream = reason(Topology::new(
            vec![agent("a")],
            vec![task("one", "a", &[]), task("two", "a", &["one", "one"])],
        ));
        assert!(repeated_upstream.contains("more than once"));
    }

    #[test]
    fn rejects_empty_crews() {
        assert!(reason(Topology::new(vec![], vec![])).contains("agent"));
        assert!(reason(Topology::new(vec![agent("a")], vec![])).contains("task"));
    }

    #[test]
    fn collects_parameters_from_agents_and_tasks() {
        let topology = Topology::new(vec![agent("a")], vec![task("one", "a", &[])]).unwrap();
        let required: Vec<_> = topology.required_parameters().into_iter().collect();
        assert_eq!(required, vec!["audience".to_string(), "topic".to_string()]);

        let err = topology
            .check_parameters(&Parameters::new().with("topic", "x"))
            .unwrap_err();
        match err {
            CrewError::MissingParameter { name, location } => {
                assert_eq!(name, "audience");
                assert_eq!(location, "task 'one' expected output");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(topology
            .check_parameters(&Parameters::new().with("topic", "x").with("audience", "y"))
            .is_ok());
    }
}

//! The sequential crew orchestrator.
//!
//! A [`Crew`] owns one validated [`Topology`] and runs it exactly once:
//!
//! ```text
//! Idle ──kickoff──▶ Running ──▶ Succeeded
//!                          └──▶ Failed
//! ```
//!
//! Tasks execute strictly in declaration order. Before the first task runs,
//! every placeholder referenced by any agent or task is checked against the
//! supplied parameters, so a missing parameter never costs a completion call.
//! The first failing task aborts the run: later tasks stay
//! [`TaskState::Pending`] and earlier outputs are kept for inspection.

use pipeline::{
    Agent, CrewError, CrewResult, Parameters, RunId, Task, TaskOutput, TaskState, TokenCount,
    Topology,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Process-wide observability setting injected into every crew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Task boundaries only; prompts and outputs at `debug`.
    #[default]
    Quiet,
    /// Also log every prompt and output at `info`.
    Verbose,
}

/// Construction-time options for a [`Crew`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrewOptions {
    pub verbosity: Verbosity,
}

/// Lifecycle of a crew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrewStatus {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrewOutput {
    pub run_id: RunId,
    /// The last task's output, exactly as returned by its agent.
    pub final_output: String,
    /// Every task's output in execution order.
    pub tasks: Vec<TaskOutput>,
    /// Sum of the usage reported for each task.
    pub usage: TokenCount,
}

/// A sequential pipeline of tasks executed by their assigned agents.
#[derive(Debug)]
pub struct Crew {
    run_id: RunId,
    topology: Topology,
    options: CrewOptions,
    status: CrewStatus,
    states: Vec<TaskState>,
}

impl Crew {
    /// Builds a crew, validating the agent/task topology.
    pub fn new(agents: Vec<Agent>, tasks: Vec<Task>, options: CrewOptions) -> CrewResult<Self> {
        Ok(Self::from_topology(Topology::new(agents, tasks)?, options))
    }

    /// Builds a crew over an already validated topology.
    pub fn from_topology(topology: Topology, options: CrewOptions) -> Self {
        let states = vec![TaskState::Pending; topology.len()];
        Self {
            run_id: RunId::new_random(),
            topology,
            options,
            status: CrewStatus::Idle,
            states,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn status(&self) -> CrewStatus {
        self.status
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Per-task state, in declaration order.
    pub fn task_states(&self) -> &[TaskState] {
        &self.states
    }

    /// Runs every task in order and returns the final task's output.
    ///
    /// A crew can only be kicked off once; later calls fail with
    /// [`CrewError::AlreadyStarted`] without running anything.
    #[instrument(skip_all, fields(run_id = %self.run_id, tasks = self.topology.len()))]
    pub async fn kickoff(&mut self, params: &Parameters) -> CrewResult<CrewOutput> {
        if self.status != CrewStatus::Idle {
            return Err(CrewError::AlreadyStarted);
        }
        if let Err(err) = self.topology.check_parameters(params) {
            self.status = CrewStatus::Failed;
            warn!(error = %err, "crew rejected parameters before any task ran");
            return Err(err);
        }

        self.status = CrewStatus::Running;
        info!("crew started");

        let mut completed = Vec::with_capacity(self.topology.len());
        for index in 0..self.topology.len() {
            let task = &self.topology.tasks()[index];
            let agent = self.topology.agent_for(index);
            let position = index + 1;

            self.states[index] = TaskState::Running;
            info!(position, task = %task.id(), agent = %agent.role(), "task started");

            let upstream: Vec<&TaskOutput> = self
                .topology
                .upstream_of(index)
                .iter()
                .filter_map(|&i| self.states[i].output())
                .collect();
            debug_assert_eq!(upstream.len(), self.topology.upstream_of(index).len());

            match task.execute(agent, &upstream, params).await {
                Ok(output) => {
                    match self.options.verbosity {
                        Verbosity::Verbose => info!(
                            position,
                            task = %task.id(),
                            prompt = %output.prompt,
                            output = %output.text,
                            "task completed"
                        ),
                        Verbosity::Quiet => {
                            info!(position, task = %task.id(), "task completed");
                            debug!(output = %output.text, "task output");
                        }
                    }
                    completed.push(output.clone());
                    self.states[index] = TaskState::Completed(output);
                }
                Err(source) => {
                    warn!(position, task = %task.id(), error = %source, "task failed; aborting crew");
                    self.states[index] = TaskState::Failed(source.to_string());
                    self.status = CrewStatus::Failed;
                    return Err(CrewError::PipelineFailure {
                        position,
                        task: task.id().clone(),
                        source: Box::new(source),
                    });
                }
            }
        }

        self.status = CrewStatus::Succeeded;
        let usage: TokenCount = completed.iter().map(|o| o.usage).sum();
        let final_output = completed
            .last()
            .map(|o| o.text.clone())
            .unwrap_or_default();
        info!(usage = %usage, "crew finished");

        Ok(CrewOutput {
            run_id: self.run_id,
            final_output,
            tasks: completed,
            usage,
        })
    }
}

//! Top-level error and retry-policy types for the crew domain.
//!
//! [`CrewError`] covers every condition that stops a crew run. Completion
//! provider failures are defined next to the port trait
//! ([`crate::completion::CompletionError`]) and reach this type wrapped in
//! [`CrewError::CompletionFailure`].
//!
//! No type in this crate catches a [`CrewError`]: errors propagate to the run
//! façade in the `nodes` crate, which converts them into a failure envelope.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{completion::CompletionError, TaskId};

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// Produced by [`CompletionError::retry_policy`] so the provider adapter can
/// decide whether to re-issue a request. The crew itself never retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt. `None` means apply the
        /// caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried.
    NonRetryable,
}

impl RetryPolicy {
    /// Returns `true` for [`RetryPolicy::Retryable`].
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable { .. })
    }
}

// ---------------------------------------------------------------------------
// Crew errors
// ---------------------------------------------------------------------------

/// Errors that stop a crew run.
#[derive(Debug, Error)]
pub enum CrewError {
    /// A template placeholder has no supplied value.
    ///
    /// Detected by the crew before any task executes.
    #[error("missing parameter '{name}' referenced by {location}")]
    MissingParameter {
        /// Name of the unresolved placeholder.
        name: String,
        /// Where the placeholder appears (e.g. `"task 'plan' description"`).
        location: String,
    },

    /// The completion capability failed while an agent was responding.
    #[error("completion failed for agent '{role}': {source}")]
    CompletionFailure {
        /// Role of the agent whose call failed.
        role: String,
        /// The provider error.
        #[source]
        source: CompletionError,
    },

    /// A task failed; wraps the underlying cause.
    #[error("task {position} ('{task}') failed: {source}")]
    PipelineFailure {
        /// 1-based position of the failing task in declaration order.
        position: usize,
        /// Identifier of the failing task.
        task: TaskId,
        /// What went wrong inside the task.
        #[source]
        source: Box<CrewError>,
    },

    /// The agents and tasks do not form a valid sequential pipeline.
    ///
    /// Produced at crew construction; a crew with an invalid topology is never
    /// created.
    #[error("invalid crew topology: {reason}")]
    InvalidTopology {
        /// Description of the problem.
        reason: String,
    },

    /// `kickoff` was called on a crew that has already run.
    #[error("crew has already been kicked off")]
    AlreadyStarted,
}

impl CrewError {
    pub(crate) fn topology(reason: impl Into<String>) -> Self {
        Self::InvalidTopology {
            reason: reason.into(),
        }
    }
}

/// Result type for crew operations.
pub type CrewResult<T> = std::result::Result<T, CrewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_failure_message_carries_the_cause() {
        let err = CrewError::PipelineFailure {
            position: 2,
            task: TaskId::new("write").unwrap(),
            source: Box::new(CrewError::CompletionFailure {
                role: "Content Writer".into(),
                source: CompletionError::Provider {
                    message: "model overloaded".into(),
                },
            }),
        };
        let text = err.to_string();
        assert!(text.starts_with("task 2 ('write') failed"));
        assert!(text.contains("Content Writer"));
        assert!(text.contains("model overloaded"));
    }

    #[test]
    fn retry_policy_classification() {
        assert!(RetryPolicy::Retryable { after: None }.is_retryable());
        assert!(!RetryPolicy::NonRetryable.is_retryable());
    }
}

//! Core crew domain for CrewLine.
//!
//! This crate contains every domain concept used to describe and run a crew:
//! identifiers, prompt templates, agents, tasks, the validated topology that
//! links them, the completion port trait, and the error taxonomy.
//! Infrastructure crates implement the traits defined here; they never add
//! domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`AgentId`, `TaskId`, `RunId`, ...) |
//! | [`types`] | Shared value types (`TokenCount`, `Timestamp`) |
//! | [`errors`] | `CrewError` and `RetryPolicy` |
//! | [`template`] | Placeholder templates and run `Parameters` |
//! | [`completion`] | The `CompletionProvider` port |
//! | [`agent`] | Agents and their personas |
//! | [`task`] | Tasks, prompt composition, task state |
//! | [`topology`] | Validated ordered agent/task graph |
//! | [`envelope`] | The caller-facing `ResultEnvelope` |
//! | [`fakes`] | Deterministic `EchoProvider` for tests |

pub mod agent;
pub mod completion;
pub mod envelope;
pub mod errors;
pub mod fakes;
pub mod identifiers;
pub mod task;
pub mod template;
pub mod topology;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use agent::{Agent, LlmBinding};
pub use completion::{Completion, CompletionError, CompletionProvider, CompletionRequest};
pub use envelope::ResultEnvelope;
pub use errors::{CrewError, CrewResult, RetryPolicy};
pub use identifiers::{AgentId, ModelName, RunId, TaskId};
pub use task::{compose_prompt, Task, TaskOutput, TaskState};
pub use template::{MissingParameter, Parameters, Template};
pub use topology::{ParameterUse, Topology};
pub use types::{Timestamp, TokenCount};

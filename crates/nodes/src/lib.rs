//! CrewLine crew orchestration and the run façade.
//!
//! This crate provides the sequential [`Crew`] orchestrator, the built-in crew
//! topologies ([`CrewKind`]), and [`CrewRunner`], the single entry point that
//! turns a topic into a [`pipeline::ResultEnvelope`].
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Sequences calls between the domain types in the
//! [`pipeline`] crate and the completion provider port. Contains no transport
//! code of its own.

pub mod crew;
pub mod crews;
pub mod runner;

pub use crew::{Crew, CrewOptions, CrewOutput, CrewStatus, Verbosity};
pub use crews::{catalogue, CrewDescriptor, CrewKind, ParseCrewKindError, DEFAULT_TOPIC};
pub use runner::{CrewModels, CrewRunner};

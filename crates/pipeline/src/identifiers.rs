//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging — for example —
//! an [`AgentId`] with a [`TaskId`] even though both are strings under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.trim().is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single crew run (one `kickoff`).
///
/// Generated fresh for every run; recorded on the run's tracing span so all
/// activity from a single run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`RunId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies an agent within one crew (e.g. `"planner"`).
    ///
    /// Tasks reference their assigned agent by this identifier rather than by
    /// holding the agent itself.
    AgentId
}

string_id! {
    /// Identifies a task within one crew (e.g. `"plan"`).
    ///
    /// Used to declare upstream dependencies and to label upstream output in
    /// a downstream task's prompt.
    TaskId
}

string_id! {
    /// A provider-specific model identifier (e.g. `"llama3-70b-8192"`).
    ModelName
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_ids_are_rejected() {
        assert!(AgentId::new("").is_none());
        assert!(TaskId::new("   ").is_none());
        assert_eq!(TaskId::new("plan").map(|t| t.to_string()), Some("plan".to_string()));
    }

    #[test]
    fn random_run_ids_differ() {
        assert_ne!(RunId::new_random(), RunId::new_random());
    }
}

//! Built-in crew topologies.
//!
//! | Kind | Mode name | Pipeline |
//! |------|-----------|----------|
//! | [`CrewKind::ContentMarketing`] | `full` | Content Planner → Content Writer → Editor |
//! | [`CrewKind::Analyst`] | `prototype` | Content Analyst |
//!
//! Every persona and task template references only the `topic` parameter.

use pipeline::{Agent, AgentId, CrewError, CrewResult, LlmBinding, Task, TaskId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Topic used when a caller does not supply one.
pub const DEFAULT_TOPIC: &str = "AI implementation in the investment industry";

/// Which built-in crew to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrewKind {
    /// Plan → write → edit.
    #[default]
    #[serde(rename = "full", alias = "content-marketing")]
    ContentMarketing,
    /// Single-agent brief analysis, for tight time budgets.
    #[serde(rename = "prototype", alias = "analyst")]
    Analyst,
}

/// The text did not name a crew kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown crew mode '{0}' (expected 'full' or 'prototype')")]
pub struct ParseCrewKindError(String);

impl std::str::FromStr for CrewKind {
    type Err = ParseCrewKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "content-marketing" => Ok(Self::ContentMarketing),
            "prototype" | "analyst" => Ok(Self::Analyst),
            _ => Err(ParseCrewKindError(s.to_string())),
        }
    }
}

impl std::fmt::Display for CrewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mode_name())
    }
}

/// Catalogue entry describing one built-in crew.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrewDescriptor {
    #[serde(rename = "type")]
    pub crew_type: &'static str,
    pub mode: CrewKind,
    pub description: &'static str,
    pub agents: Vec<&'static str>,
    pub estimated_time: &'static str,
}

impl CrewKind {
    pub const ALL: [CrewKind; 2] = [CrewKind::ContentMarketing, CrewKind::Analyst];

    /// The name used on the CLI and in HTTP requests.
    pub fn mode_name(self) -> &'static str {
        match self {
            Self::ContentMarketing => "full",
            Self::Analyst => "prototype",
        }
    }

    /// Model used when the environment does not name one.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::ContentMarketing => "llama3-70b-8192",
            Self::Analyst => "llama3-8b-8192",
        }
    }

    pub fn descriptor(self) -> CrewDescriptor {
        match self {
            Self::ContentMarketing => CrewDescriptor {
                crew_type: "content-marketing",
                mode: self,
                description: "Content planning, writing, and editing workflow",
                agents: vec![PLANNER_ROLE, WRITER_ROLE, EDITOR_ROLE],
                estimated_time: "2-5 minutes",
            },
            Self::Analyst => CrewDescriptor {
                crew_type: "content-analysis",
                mode: self,
                description: "Single-agent brief analysis with one actionable recommendation",
                agents: vec![ANALYST_ROLE],
                estimated_time: "10-60 seconds",
            },
        }
    }

    /// Builds this crew's agents and tasks, all speaking through `llm`.
    pub fn build(self, llm: &LlmBinding) -> CrewResult<(Vec<Agent>, Vec<Task>)> {
        match self {
            Self::ContentMarketing => content_marketing(llm),
            Self::Analyst => analyst(llm),
        }
    }
}

/// Descriptors for every built-in crew.
pub fn catalogue() -> Vec<CrewDescriptor> {
    CrewKind::ALL.iter().map(|kind| kind.descriptor()).collect()
}

// ---------------------------------------------------------------------------
// Content marketing: plan → write → edit
// ---------------------------------------------------------------------------

const PLANNER_ROLE: &str = "Content Planner";
const WRITER_ROLE: &str = "Content Writer";
const EDITOR_ROLE: &str = "Editor";
const ANALYST_ROLE: &str = "Content Analyst";

fn content_marketing(llm: &LlmBinding) -> CrewResult<(Vec<Agent>, Vec<Task>)> {
    let planner = Agent::new(
        agent_id("planner")?,
        PLANNER_ROLE,
        "Plan engaging and factually accurate content on {topic}",
        "You're working on planning a memo for the management team of a big \
         investment firm about the topic: {topic}. \
         You collect information that helps the audience learn something \
         and make informed decisions. \
         Your work is the basis for the Content Writer to write an article on this topic.",
        llm.clone(),
    );
    let writer = Agent::new(
        agent_id("writer")?,
        WRITER_ROLE,
        "Write insightful and factually accurate memo piece about the topic: {topic}",
        "You're working on writing a new opinion piece about the topic: {topic}. \
         You base your writing on the work of the Content Planner, who provides an outline \
         and relevant context about the topic. \
         You follow the main objectives and direction of the outline, \
         as provided by the Content Planner. \
         You also provide objective and impartial insights \
         and back them up with information provided by the Content Planner. \
         You acknowledge in your opinion piece when your statements are opinions \
         as opposed to objective statements.",
        llm.clone(),
    );
    let editor = Agent::new(
        agent_id("editor")?,
        EDITOR_ROLE,
        "Edit a given memo to align with the writing style of the organization.",
        "You are an editor who receives a technical memo from the Content Writer. \
         Your goal is to review the memo to ensure that it follows best practices in writing, \
         provides balanced viewpoints when providing opinions or assertions, \
         and also avoids major controversial topics or opinions when possible.",
        llm.clone(),
    );

    let plan = Task::new(
        task_id("plan")?,
        "1. Prioritize the latest trends, key players, and noteworthy news on {topic}.\n\
         2. Identify the target audience, considering their interests and pain points.\n\
         3. Develop a detailed content outline including an introduction, key points, \
         and a call to action.\n\
         4. Include relevant data or sources.",
        "A comprehensive content plan document with an outline, audience analysis, \
         and resources.",
        planner.id().clone(),
    );
    let write = Task::new(
        task_id("write")?,
        "1. Use the content plan to craft a compelling memo on {topic}.\n\
         2. Incorporate technical wording with pedagogical language.\n\
         3. Sections/Subtitles are properly named in an engaging manner.\n\
         4. Ensure the post is structured with an engaging introduction, insightful body, \
         and a summarizing conclusion.\n\
         5. Proofread for grammatical errors and alignment with the brand's voice.",
        "A well-written memo in markdown format, ready for publication, \
         each section should have 2 or 3 paragraphs.",
        writer.id().clone(),
    )
    .with_upstream([plan.id().clone()]);
    let edit = Task::new(
        task_id("edit")?,
        "Proofread the given memo on {topic} for grammatical errors and \
         alignment with the brand's voice.",
        "A well-written memo in markdown format, ready for publication, \
         each section should have 2 or 3 paragraphs.",
        editor.id().clone(),
    )
    .with_upstream([write.id().clone()]);

    Ok((vec![planner, writer, editor], vec![plan, write, edit]))
}

// ---------------------------------------------------------------------------
// Analyst: single task
// ---------------------------------------------------------------------------

fn analyst(llm: &LlmBinding) -> CrewResult<(Vec<Agent>, Vec<Task>)> {
    let analyst = Agent::new(
        agent_id("analyst")?,
        ANALYST_ROLE,
        "Create a brief analysis on {topic}",
        "You're a content analyst who creates concise, insightful summaries on business topics. \
         You focus on key points and actionable insights.",
        llm.clone(),
    );
    let analysis = Task::new(
        task_id("analysis")?,
        "Create a brief 2-paragraph analysis on {topic}. \
         Include key insights and one actionable recommendation.",
        "A concise 2-paragraph analysis with actionable insights.",
        analyst.id().clone(),
    );
    Ok((vec![analyst], vec![analysis]))
}

fn agent_id(id: &str) -> CrewResult<AgentId> {
    AgentId::new(id).ok_or_else(|| CrewError::InvalidTopology {
        reason: "agent id must not be empty".to_string(),
    })
}

fn task_id(id: &str) -> CrewResult<TaskId> {
    TaskId::new(id).ok_or_else(|| CrewError::InvalidTopology {
        reason: "task id must not be empty".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pipeline::fakes::EchoProvider;
    use pipeline::{ModelName, Topology};

    use super::*;

    fn binding() -> LlmBinding {
        LlmBinding::new(Arc::new(EchoProvider::new()), ModelName::new("stub").unwrap())
    }

    #[test]
    fn content_marketing_chains_plan_write_edit() {
        let (agents, tasks) = CrewKind::ContentMarketing.build(&binding()).unwrap();
        let topology = Topology::new(agents, tasks).unwrap();

        let ids: Vec<_> = topology.tasks().iter().map(|t| t.id().as_str()).collect();
        assert_eq!(ids, vec!["plan", "write", "edit"]);
        assert_eq!(topology.upstream_of(1), &[0]);
        assert_eq!(topology.upstream_of(2), &[1]);
        assert_eq!(topology.agent_for(2).role(), "Editor");
        assert!(topology.agents().iter().all(|a| !a.allows_delegation()));
    }

    #[test]
    fn built_in_crews_only_need_a_topic() {
        for kind in CrewKind::ALL {
            let (agents, tasks) = kind.build(&binding()).unwrap();
            let required: Vec<_> = Topology::new(agents, tasks)
                .unwrap()
                .required_parameters()
                .into_iter()
                .collect();
            assert_eq!(required, vec!["topic".to_string()], "{kind}");
        }
    }

    #[test]
    fn parses_mode_names_and_aliases() {
        assert_eq!("full".parse::<CrewKind>().unwrap(), CrewKind::ContentMarketing);
        assert_eq!("Prototype".parse::<CrewKind>().unwrap(), CrewKind::Analyst);
        assert_eq!("analyst".parse::<CrewKind>().unwrap(), CrewKind::Analyst);
        assert!("fast".parse::<CrewKind>().is_err());

        let kind: CrewKind = serde_json::from_str("\"content-marketing\"").unwrap();
        assert_eq!(kind, CrewKind::ContentMarketing);
        assert_eq!(serde_json::to_string(&CrewKind::Analyst).unwrap(), "\"prototype\"");
    }

    #[test]
    fn catalogue_lists_roles_per_crew() {
        let entries = catalogue();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].crew_type, "content-marketing");
        assert_eq!(entries[0].agents, vec!["Content Planner", "Content Writer", "Editor"]);
        assert_eq!(entries[1].agents, vec!["Content Analyst"]);
    }
}
